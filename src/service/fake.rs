// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::{
    error,
    model::{Course, Selection, Token},
};

use super::{Service, Verification};

pub(crate) fn course(code: &str, credits: u32) -> Course {
    Course {
        code: code.to_owned(),
        name: format!("Course {code}"),
        credits,
        faculty: None,
        major: None,
        description: None,
    }
}

pub(crate) fn selection(codes: &[&str], capacity: u32) -> Selection {
    Selection::new(codes.iter().map(|code| course(code, 3)).collect(), capacity)
}

/// Answers each call with the next scripted response and counts calls.
#[derive(Default)]
pub(crate) struct Scripted {
    verifications: Mutex<VecDeque<Verification>>,
    snapshots: Mutex<VecDeque<Result<Selection, error::Service>>>,
    verify_calls: AtomicUsize,
    selection_calls: AtomicUsize,
}

impl Scripted {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn then_verify(self, verification: Verification) -> Self {
        self.verifications.lock().unwrap().push_back(verification);
        self
    }

    pub(crate) fn then_snapshot(self, snapshot: Result<Selection, error::Service>) -> Self {
        self.snapshots.lock().unwrap().push_back(snapshot);
        self
    }

    pub(crate) fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn selection_calls(&self) -> usize {
        self.selection_calls.load(Ordering::SeqCst)
    }

    fn next_snapshot(&self) -> Result<Selection, error::Service> {
        let _ = self.selection_calls.fetch_add(1, Ordering::SeqCst);
        self.snapshots
            .lock()
            .unwrap()
            .pop_front()
            .expect("no selection response was scripted")
    }
}

#[async_trait]
impl Service for Scripted {
    async fn verify(&self, _token: &Token) -> Verification {
        let _ = self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.verifications
            .lock()
            .unwrap()
            .pop_front()
            .expect("no verification response was scripted")
    }

    async fn fetch_selection(&self, _token: &Token) -> Result<Selection, error::Service> {
        self.next_snapshot()
    }

    async fn add_course(&self, _token: &Token, _code: &str) -> Result<Selection, error::Service> {
        self.next_snapshot()
    }

    async fn remove_course(
        &self,
        _token: &Token,
        _code: &str,
    ) -> Result<Selection, error::Service> {
        self.next_snapshot()
    }

    async fn clear_selection(&self, _token: &Token) -> Result<Selection, error::Service> {
        self.next_snapshot()
    }
}

/// A request held open until the test answers it.
pub(crate) struct Pending {
    pub(crate) code: String,
    pub(crate) reply: oneshot::Sender<Result<Selection, error::Service>>,
}

/// An identity check held open until the test answers it.
pub(crate) struct PendingVerification {
    pub(crate) token: Token,
    pub(crate) reply: oneshot::Sender<Verification>,
}

/// Parks every selection request so a test controls the order responses
/// arrive in. Identity checks are parked too once
/// [`Gated::hold_verifications`] is called.
pub(crate) struct Gated {
    requests: mpsc::UnboundedSender<Pending>,
    verifications: Option<mpsc::UnboundedSender<PendingVerification>>,
}

impl Gated {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<Pending>) {
        let (requests, rx) = mpsc::unbounded_channel();
        (
            Self {
                requests,
                verifications: None,
            },
            rx,
        )
    }

    pub(crate) fn hold_verifications(
        mut self,
    ) -> (Self, mpsc::UnboundedReceiver<PendingVerification>) {
        let (verifications, rx) = mpsc::unbounded_channel();
        self.verifications = Some(verifications);
        (self, rx)
    }

    async fn park(&self, code: &str) -> Result<Selection, error::Service> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(Pending {
                code: code.to_owned(),
                reply,
            })
            .unwrap();
        rx.await.unwrap()
    }
}

#[async_trait]
impl Service for Gated {
    async fn verify(&self, token: &Token) -> Verification {
        let verifications = self
            .verifications
            .as_ref()
            .expect("identity checks are not held open");
        let (reply, rx) = oneshot::channel();
        verifications
            .send(PendingVerification {
                token: token.clone(),
                reply,
            })
            .unwrap();
        rx.await.unwrap()
    }

    async fn fetch_selection(&self, _token: &Token) -> Result<Selection, error::Service> {
        self.park("").await
    }

    async fn add_course(&self, _token: &Token, code: &str) -> Result<Selection, error::Service> {
        self.park(code).await
    }

    async fn remove_course(
        &self,
        _token: &Token,
        code: &str,
    ) -> Result<Selection, error::Service> {
        self.park(code).await
    }

    async fn clear_selection(&self, _token: &Token) -> Result<Selection, error::Service> {
        self.park("").await
    }
}
