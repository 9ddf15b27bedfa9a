// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! The courses a user has selected, as the catalog service last confirmed
//! them.
//!
//! Every change round-trips to the service and the local copy is replaced
//! only by a complete snapshot from a successful response. Overlapping
//! requests are not ordered: when two additions are in flight, whichever
//! response arrives last becomes the local selection. Since every response is
//! a whole snapshot, that outcome is always a state the service actually
//! held.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use log::{debug, info, warn};
use tokio::{
    sync::watch,
    time::{self, Instant},
};

use crate::{
    config::DEFAULT_NOTICE_WINDOW,
    error,
    model::{Selection, Token},
    service::Service,
};

/// A failed change, shown to the user for a limited time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    id: u64,
    message: String,
    expires_at: Instant,
}

impl Notice {
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn expires_at(&self) -> Instant {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

pub struct SelectionSynchronizer<S> {
    service: S,
    selection: watch::Sender<Selection>,
    notice: Arc<watch::Sender<Option<Notice>>>,
    // Bumped by every lifecycle call. Responses to requests issued under an
    // older epoch are not applied.
    epoch: AtomicU64,
    next_notice_id: AtomicU64,
    notice_window: Duration,
}

impl<S: Service> SelectionSynchronizer<S> {
    pub fn new(service: S) -> Self {
        let (selection, _) = watch::channel(Selection::default());
        let (notice, _) = watch::channel(None);
        Self {
            service,
            selection,
            notice: Arc::new(notice),
            epoch: AtomicU64::new(0),
            next_notice_id: AtomicU64::new(0),
            notice_window: DEFAULT_NOTICE_WINDOW,
        }
    }

    #[must_use]
    pub fn with_notice_window(mut self, window: Duration) -> Self {
        self.notice_window = window;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<Selection> {
        self.selection.subscribe()
    }

    /// Follows the transient error; it returns to `None` once the display
    /// window has passed.
    pub fn subscribe_notices(&self) -> watch::Receiver<Option<Notice>> {
        self.notice.subscribe()
    }

    pub fn selection(&self) -> Selection {
        self.selection.borrow().clone()
    }

    pub fn capacity(&self) -> u32 {
        self.selection.borrow().capacity()
    }

    pub fn total_credits(&self) -> u32 {
        self.selection.borrow().total_credits()
    }

    /// Answers from the last confirmed snapshot without contacting the
    /// service.
    pub fn is_selected(&self, code: &str) -> bool {
        self.selection.borrow().contains(code)
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice
            .borrow()
            .as_ref()
            .filter(|notice| !notice.is_expired())
            .cloned()
    }

    pub fn dismiss_notice(&self) {
        let _ = self.notice.send_replace(None);
    }

    /// The host is about to display the selection for `token`.
    pub async fn on_mount(&self, token: &Token) {
        self.begin_epoch();
        let _ = self.fetch_selection(token).await;
    }

    /// The active identity changed. The previous user's selection is
    /// discarded before anything is fetched for the new one.
    pub async fn on_token_change(&self, token: Option<&Token>) {
        self.begin_epoch();
        let _ = self.selection.send_replace(Selection::default());
        self.dismiss_notice();
        if let Some(token) = token {
            let _ = self.fetch_selection(token).await;
        }
    }

    /// The host no longer displays the selection; responses still in flight
    /// are returned to their callers but not applied.
    pub fn on_unmount(&self) {
        self.begin_epoch();
    }

    /// Loads the selection. A failure keeps whatever was last known.
    ///
    /// # Errors
    ///
    /// Returns the service failure, which callers may ignore.
    pub async fn fetch_selection(&self, token: &Token) -> Result<Selection, error::Service> {
        let epoch = self.current_epoch();
        match self.service.fetch_selection(token).await {
            Ok(selection) => {
                debug!(
                    "Fetched {} of {} selected courses",
                    selection.len(),
                    selection.capacity()
                );
                self.apply(epoch, &selection);
                Ok(selection)
            }
            Err(e) => {
                warn!(
                    "We could not load the course selection, so we are keeping the last known one: {}",
                    e
                );
                Err(e)
            }
        }
    }

    /// Asks the service to add a course. Capacity is not checked locally; the
    /// service decides.
    ///
    /// # Errors
    ///
    /// Returns the service failure. The local selection is left unchanged and
    /// a notice is raised for the display window.
    pub async fn add_course(&self, token: &Token, code: &str) -> Result<Selection, error::Service> {
        let epoch = self.current_epoch();
        match self.service.add_course(token, code).await {
            Ok(selection) => {
                info!(
                    "Added {} to the selection ({} of {} courses)",
                    code,
                    selection.len(),
                    selection.capacity()
                );
                self.apply(epoch, &selection);
                Ok(selection)
            }
            Err(e) => {
                warn!("We could not add {} to the selection: {}", code, e);
                if self.is_current(epoch) {
                    self.raise(e.user_message());
                }
                Err(e)
            }
        }
    }

    /// # Errors
    ///
    /// Returns the service failure. The local selection is left unchanged;
    /// the failure is logged but raises no notice.
    pub async fn remove_course(
        &self,
        token: &Token,
        code: &str,
    ) -> Result<Selection, error::Service> {
        let epoch = self.current_epoch();
        match self.service.remove_course(token, code).await {
            Ok(selection) => {
                info!("Removed {} from the selection", code);
                self.apply(epoch, &selection);
                Ok(selection)
            }
            Err(e) => {
                warn!("We could not remove {} from the selection: {}", code, e);
                Err(e)
            }
        }
    }

    /// Removes every selected course.
    ///
    /// # Errors
    ///
    /// As [`Self::remove_course`].
    pub async fn clear_selection(&self, token: &Token) -> Result<Selection, error::Service> {
        let epoch = self.current_epoch();
        match self.service.clear_selection(token).await {
            Ok(selection) => {
                info!("Cleared the selection");
                self.apply(epoch, &selection);
                Ok(selection)
            }
            Err(e) => {
                warn!("We could not clear the selection: {}", e);
                Err(e)
            }
        }
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn begin_epoch(&self) {
        let _ = self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.current_epoch() == epoch
    }

    fn apply(&self, epoch: u64, selection: &Selection) {
        let _ = self.selection.send_if_modified(|current| {
            if !self.is_current(epoch) {
                debug!("Ignoring a selection that arrived after the view changed");
                return false;
            }
            if *current == *selection {
                return false;
            }
            *current = selection.clone();
            true
        });
    }

    fn raise(&self, message: &str) {
        let id = self.next_notice_id.fetch_add(1, Ordering::SeqCst);
        let expires_at = Instant::now() + self.notice_window;
        let _ = self.notice.send_replace(Some(Notice {
            id,
            message: message.to_owned(),
            expires_at,
        }));

        let notice = Arc::clone(&self.notice);
        let _ = tokio::spawn(async move {
            time::sleep_until(expires_at).await;
            let _ = notice.send_if_modified(|current| {
                if current.as_ref().is_some_and(|n| n.id == id) {
                    *current = None;
                    true
                } else {
                    false
                }
            });
        });
    }
}
