// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Who is logged in.
//!
//! The cache answers from the last verified user when it can and asks the
//! catalog service otherwise. A definitive rejection from the service always
//! wins over the cache. An ambiguous failure never logs out a user already
//! verified for the stored token; see [`AmbiguousAuthPolicy`] for the case
//! where no user has been verified yet.

use std::{fmt, sync::Arc};

use futures_util::lock::Mutex;
use log::{debug, info, warn};
use tokio::sync::watch;

use crate::{
    config::AmbiguousAuthPolicy,
    error::Result,
    model::{Token, User},
    service::{Service, Verification},
    storage::Storage,
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthState {
    /// Nothing has been checked yet.
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

impl AuthState {
    /// Whether protected views may be shown. Only a settled, positive answer
    /// grants access.
    #[must_use]
    pub const fn grants_access(self) -> bool {
        matches!(self, Self::Authenticated)
    }

    /// Whether the host should show a loading indicator instead of content.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unknown => "checking",
            Self::Authenticated => "authenticated",
            Self::Unauthenticated => "unauthenticated",
        })
    }
}

/// What consumers observe: the authentication state and, when one has been
/// verified, the user behind it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    state: AuthState,
    user: Option<User>,
}

impl Session {
    #[must_use]
    pub const fn state(&self) -> AuthState {
        self.state
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    fn is_verified_for(&self, token: &Token) -> bool {
        self.user.as_ref().is_some_and(|user| user.is_for(token))
    }
}

pub struct SessionCache<S, T> {
    service: S,
    storage: Arc<Mutex<T>>,
    session: watch::Sender<Session>,
    policy: AmbiguousAuthPolicy,
}

impl<S: Service, T: Storage<Token>> SessionCache<S, T> {
    pub fn new(service: S, storage: Arc<Mutex<T>>) -> Self {
        let (session, _) = watch::channel(Session::default());
        Self {
            service,
            storage,
            session,
            policy: AmbiguousAuthPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: AmbiguousAuthPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Follows every change to the session.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.session.borrow().state
    }

    pub fn user(&self) -> Option<User> {
        self.session.borrow().user.clone()
    }

    pub async fn persists_token(&self) -> bool {
        self.storage.lock().await.is_persistent()
    }

    /// The token to hand to other components, if the session currently
    /// grants access.
    ///
    /// # Errors
    ///
    /// Fails if the token storage cannot be read.
    pub async fn identity(&self) -> Result<Option<Token>> {
        if !self.state().grants_access() {
            return Ok(None);
        }
        self.storage.lock().await.get().await
    }

    /// Decides whether the stored token belongs to an authenticated user.
    ///
    /// Without `force_refresh`, a user already verified for the stored token
    /// answers the question without contacting the service.
    ///
    /// # Errors
    ///
    /// Fails only if the token storage cannot be read or written. Service
    /// failures are folded into the returned answer. A rejected token logs
    /// the session out even when deleting it fails.
    pub async fn check_authentication(&self, force_refresh: bool) -> Result<bool> {
        let token = {
            let mut storage = self.storage.lock().await;
            match storage.get().await? {
                Some(token) => token,
                None => {
                    debug!("No identity token is stored");
                    self.publish(AuthState::Unauthenticated, None);
                    return Ok(false);
                }
            }
        };

        if !force_refresh && self.session.borrow().is_verified_for(&token) {
            debug!("Using the cached user for the stored token");
            self.publish_state(AuthState::Authenticated);
            return Ok(true);
        }

        let verification = self.service.verify(&token).await;

        // The token may have been replaced or removed while the request was
        // in flight; in that case this answer is about a session that no
        // longer exists.
        let mut storage = self.storage.lock().await;
        if storage.get().await?.as_ref() != Some(&token) {
            debug!("The stored token changed during verification; ignoring the result");
            return Ok(self.state().grants_access());
        }

        match verification {
            Verification::Confirmed(user) => {
                info!("Verified the session of {}", user.name);
                self.publish(AuthState::Authenticated, Some(user));
                Ok(true)
            }
            Verification::Rejected => {
                info!("The catalog service rejected the stored token; logging out");
                self.publish(AuthState::Unauthenticated, None);
                storage.clear().await?;
                Ok(false)
            }
            Verification::Ambiguous(reason) => Ok(self.settle_ambiguous(&token, &reason)),
        }
    }

    fn settle_ambiguous(&self, token: &Token, reason: &str) -> bool {
        if self.session.borrow().is_verified_for(token) {
            info!(
                "We could not re-verify the session ({}); keeping the verified user",
                reason
            );
            self.publish_state(AuthState::Authenticated);
            return true;
        }

        match self.policy {
            AmbiguousAuthPolicy::FailOpen => {
                warn!(
                    "We could not verify the stored token ({}); treating the session as authenticated until the service answers",
                    reason
                );
                self.publish(AuthState::Authenticated, None);
                true
            }
            AmbiguousAuthPolicy::FailClosed => {
                warn!(
                    "We could not verify the stored token ({}); treating the session as unauthenticated until the service answers",
                    reason
                );
                self.publish(AuthState::Unauthenticated, None);
                false
            }
        }
    }

    /// Checks the stored token against the service, ignoring the cache.
    ///
    /// # Errors
    ///
    /// See [`Self::check_authentication`].
    pub async fn refresh_user(&self) -> Result<bool> {
        self.check_authentication(true).await
    }

    /// Records a user whose identity a separate login flow already
    /// established.
    ///
    /// # Errors
    ///
    /// Fails if the token cannot be persisted; the session is left as it was.
    pub async fn login(&self, user: User) -> Result<()> {
        let mut storage = self.storage.lock().await;
        storage.update(&user.uid).await?;
        info!("Logged in as {}", user.name);
        self.publish(AuthState::Authenticated, Some(user));
        Ok(())
    }

    /// Forgets the user. The session is unauthenticated afterwards even if
    /// the stored token cannot be removed.
    ///
    /// # Errors
    ///
    /// Fails if the stored token cannot be removed.
    pub async fn logout(&self) -> Result<()> {
        let mut storage = self.storage.lock().await;
        self.publish(AuthState::Unauthenticated, None);
        info!("Logged out");
        storage.clear().await
    }

    fn publish(&self, state: AuthState, user: Option<User>) {
        let _ = self.session.send_replace(Session { state, user });
    }

    fn publish_state(&self, state: AuthState) {
        let _ = self.session.send_if_modified(|session| {
            let changed = session.state != state;
            session.state = state;
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        error::Error,
        service::fake::{Gated, Scripted},
        storage::{self, IsPersistent},
    };

    /// Reads and writes like memory but refuses to delete.
    struct Undeletable(storage::Memory<Token>);

    impl IsPersistent for Undeletable {
        fn is_persistent(&self) -> bool {
            true
        }
    }

    #[async_trait]
    impl Storage<Token> for Undeletable {
        async fn get(&mut self) -> Result<Option<Token>> {
            self.0.get().await
        }

        async fn update(&mut self, data: &Token) -> Result<()> {
            self.0.update(data).await
        }

        async fn clear(&mut self) -> Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    type Cache = SessionCache<Arc<Scripted>, storage::Memory<Token>>;

    fn cache(service: &Arc<Scripted>, storage: &storage::Memory<Token>) -> Cache {
        SessionCache::new(Arc::clone(service), Arc::new(Mutex::new(storage.clone())))
    }

    fn ana() -> User {
        User::new(Token::new("abc"), "Ana")
    }

    async fn stored(storage: &storage::Memory<Token>) -> Option<Token> {
        storage.clone().get().await.unwrap()
    }

    #[tokio::test]
    async fn starts_pending_without_access() {
        let service = Arc::new(Scripted::new());
        let cache = cache(&service, &storage::Memory::new());
        assert_eq!(cache.state(), AuthState::Unknown);
        assert!(cache.state().is_pending());
        assert!(!cache.state().grants_access());
        assert_eq!(cache.identity().await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_token_is_unauthenticated_without_network() {
        let service = Arc::new(Scripted::new());
        let cache = cache(&service, &storage::Memory::new());

        assert!(!cache.check_authentication(false).await.unwrap());
        assert!(!cache.check_authentication(true).await.unwrap());
        assert_eq!(cache.state(), AuthState::Unauthenticated);
        assert_eq!(service.verify_calls(), 0);
    }

    #[tokio::test]
    async fn confirmed_token_authenticates() {
        let service = Arc::new(
            Scripted::new().then_verify(Verification::Confirmed(ana())),
        );
        let storage = storage::Memory::with_value(Token::new("abc"));
        let cache = cache(&service, &storage);

        assert!(cache.check_authentication(false).await.unwrap());
        assert_eq!(cache.state(), AuthState::Authenticated);
        assert_eq!(cache.user().unwrap().name, "Ana");
        assert!(!cache.user().unwrap().has_registered_courses);
        assert_eq!(cache.identity().await.unwrap(), Some(Token::new("abc")));
    }

    #[tokio::test]
    async fn cached_user_answers_without_network() {
        let service = Arc::new(
            Scripted::new().then_verify(Verification::Confirmed(ana())),
        );
        let storage = storage::Memory::with_value(Token::new("abc"));
        let cache = cache(&service, &storage);

        assert!(cache.check_authentication(false).await.unwrap());
        for _ in 0..3 {
            assert!(cache.check_authentication(false).await.unwrap());
        }
        assert_eq!(service.verify_calls(), 1);
    }

    #[tokio::test]
    async fn cached_user_for_another_token_is_not_a_hit() {
        let service = Arc::new(Scripted::new().then_verify(Verification::Confirmed(
            User::new(Token::new("xyz"), "Xu"),
        )));
        let storage = storage::Memory::new();
        let cache = cache(&service, &storage);

        cache.login(ana()).await.unwrap();
        storage.clone().update(&Token::new("xyz")).await.unwrap();

        assert!(cache.check_authentication(false).await.unwrap());
        assert_eq!(service.verify_calls(), 1);
        assert_eq!(cache.user().unwrap().name, "Xu");
    }

    #[tokio::test]
    async fn rejection_deletes_token_and_logs_out() {
        let service = Arc::new(
            Scripted::new()
                .then_verify(Verification::Confirmed(ana()))
                .then_verify(Verification::Rejected),
        );
        let storage = storage::Memory::with_value(Token::new("abc"));
        let cache = cache(&service, &storage);
        assert!(cache.check_authentication(false).await.unwrap());

        assert!(!cache.refresh_user().await.unwrap());
        assert_eq!(cache.state(), AuthState::Unauthenticated);
        assert_eq!(cache.user(), None);
        assert_eq!(stored(&storage).await, None);
        assert_eq!(service.verify_calls(), 2);
    }

    #[tokio::test]
    async fn rejection_logs_out_even_if_the_token_cannot_be_deleted() {
        let service = Arc::new(
            Scripted::new()
                .then_verify(Verification::Confirmed(ana()))
                .then_verify(Verification::Rejected)
                .then_verify(Verification::Rejected),
        );
        let storage = Undeletable(storage::Memory::with_value(Token::new("abc")));
        let cache = SessionCache::new(Arc::clone(&service), Arc::new(Mutex::new(storage)));
        assert!(cache.check_authentication(false).await.unwrap());

        assert!(matches!(cache.refresh_user().await, Err(Error::Io(_))));
        assert_eq!(cache.state(), AuthState::Unauthenticated);
        assert_eq!(cache.user(), None);
        assert_eq!(cache.identity().await.unwrap(), None);

        // The stale user must not answer from the cache.
        assert!(cache.check_authentication(false).await.is_err());
        assert_eq!(service.verify_calls(), 3);
        assert_eq!(cache.state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn logout_succeeds_locally_if_the_token_cannot_be_deleted() {
        let service = Arc::new(Scripted::new());
        let storage = Undeletable(storage::Memory::new());
        let cache = SessionCache::new(Arc::clone(&service), Arc::new(Mutex::new(storage)));
        cache.login(ana()).await.unwrap();
        assert_eq!(cache.state(), AuthState::Authenticated);

        assert!(matches!(cache.logout().await, Err(Error::Io(_))));
        assert_eq!(cache.state(), AuthState::Unauthenticated);
        assert_eq!(cache.user(), None);
    }

    #[tokio::test]
    async fn rejection_for_a_replaced_token_keeps_the_new_login() {
        let (service, _requests) = Gated::new();
        let (service, mut verifications) = service.hold_verifications();
        let storage = storage::Memory::with_value(Token::new("abc"));
        let cache = Arc::new(SessionCache::new(
            Arc::new(service),
            Arc::new(Mutex::new(storage.clone())),
        ));

        let check = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.check_authentication(false).await.unwrap() }
        });
        let pending = verifications.recv().await.unwrap();
        assert_eq!(pending.token, Token::new("abc"));

        let xu = User::new(Token::new("xyz"), "Xu");
        cache.login(xu.clone()).await.unwrap();
        pending.reply.send(Verification::Rejected).unwrap();

        assert!(check.await.unwrap());
        assert_eq!(stored(&storage).await, Some(Token::new("xyz")));
        assert_eq!(cache.state(), AuthState::Authenticated);
        assert_eq!(cache.user(), Some(xu));
    }

    #[tokio::test]
    async fn last_verification_to_arrive_wins() {
        let (service, _requests) = Gated::new();
        let (service, mut verifications) = service.hold_verifications();
        let storage = storage::Memory::with_value(Token::new("abc"));
        let cache = Arc::new(SessionCache::new(
            Arc::new(service),
            Arc::new(Mutex::new(storage.clone())),
        ));

        let first = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.refresh_user().await.unwrap() }
        });
        let first_pending = verifications.recv().await.unwrap();
        let second = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.refresh_user().await.unwrap() }
        });
        let second_pending = verifications.recv().await.unwrap();

        second_pending
            .reply
            .send(Verification::Confirmed(ana()))
            .unwrap();
        assert!(second.await.unwrap());

        let renamed = User::new(Token::new("abc"), "Ana Lima");
        first_pending
            .reply
            .send(Verification::Confirmed(renamed.clone()))
            .unwrap();
        assert!(first.await.unwrap());

        assert_eq!(cache.user(), Some(renamed));
        assert_eq!(stored(&storage).await, Some(Token::new("abc")));
    }

    #[tokio::test]
    async fn ambiguous_failures_keep_a_verified_user() {
        let service = Arc::new(
            Scripted::new()
                .then_verify(Verification::Confirmed(ana()))
                .then_verify(Verification::Ambiguous("timed out".to_owned()))
                .then_verify(Verification::Ambiguous("server responded with 500".to_owned()))
                .then_verify(Verification::Ambiguous("connection reset".to_owned())),
        );
        let storage = storage::Memory::with_value(Token::new("abc"));
        let cache = cache(&service, &storage).with_policy(AmbiguousAuthPolicy::FailClosed);
        assert!(cache.check_authentication(false).await.unwrap());

        for _ in 0..3 {
            assert!(cache.check_authentication(true).await.unwrap());
            assert_eq!(cache.state(), AuthState::Authenticated);
            assert_eq!(cache.user(), Some(ana()));
            assert_eq!(stored(&storage).await, Some(Token::new("abc")));
        }
    }

    #[tokio::test]
    async fn ambiguous_failure_without_user_fails_open_by_default() {
        let service = Arc::new(
            Scripted::new().then_verify(Verification::Ambiguous("timed out".to_owned())),
        );
        let storage = storage::Memory::with_value(Token::new("abc"));
        let cache = cache(&service, &storage);

        assert!(cache.check_authentication(false).await.unwrap());
        assert_eq!(cache.state(), AuthState::Authenticated);
        assert_eq!(cache.user(), None);
        assert_eq!(stored(&storage).await, Some(Token::new("abc")));
    }

    #[tokio::test]
    async fn ambiguous_failure_without_user_can_fail_closed() {
        let service = Arc::new(
            Scripted::new().then_verify(Verification::Ambiguous("timed out".to_owned())),
        );
        let storage = storage::Memory::with_value(Token::new("abc"));
        let cache = cache(&service, &storage).with_policy(AmbiguousAuthPolicy::FailClosed);

        assert!(!cache.check_authentication(false).await.unwrap());
        assert_eq!(cache.state(), AuthState::Unauthenticated);
        assert_eq!(stored(&storage).await, Some(Token::new("abc")));
    }

    #[tokio::test]
    async fn login_and_logout_manage_the_stored_token() {
        let service = Arc::new(Scripted::new());
        let storage = storage::Memory::new();
        let cache = cache(&service, &storage);
        let mut updates = cache.subscribe();

        cache.login(ana()).await.unwrap();
        assert_eq!(stored(&storage).await, Some(Token::new("abc")));
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().state(), AuthState::Authenticated);

        assert!(cache.check_authentication(false).await.unwrap());
        assert_eq!(service.verify_calls(), 0);

        cache.logout().await.unwrap();
        assert_eq!(stored(&storage).await, None);
        assert_eq!(cache.state(), AuthState::Unauthenticated);
        assert_eq!(updates.borrow_and_update().user(), None);

        cache.logout().await.unwrap();
    }

    #[test]
    fn state_names() {
        assert_eq!(AuthState::Unknown.to_string(), "checking");
        assert_eq!(AuthState::Authenticated.to_string(), "authenticated");
        assert_eq!(AuthState::Unauthenticated.to_string(), "unauthenticated");
    }
}
