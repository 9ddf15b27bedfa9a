// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! The catalog and identity service, as the client sees it.
//!
//! Every answer the service gives is authoritative. Implementations only
//! classify responses; they never keep state of their own.

#[cfg(test)]
pub(crate) mod fake;
mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error,
    model::{Selection, Token, User},
};

pub use http::Http;

/// The outcome of asking the service who a token belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verification {
    /// The service knows the token and returned its user.
    Confirmed(User),
    /// The service stated that the token is unknown or invalid.
    Rejected,
    /// Anything else: the service could not be reached, failed, or answered
    /// in a way that says nothing about the token. Carries detail for logs.
    Ambiguous(String),
}

#[async_trait]
pub trait Service: Send + Sync {
    async fn verify(&self, token: &Token) -> Verification;

    async fn fetch_selection(&self, token: &Token) -> Result<Selection, error::Service>;

    async fn add_course(&self, token: &Token, code: &str) -> Result<Selection, error::Service>;

    async fn remove_course(&self, token: &Token, code: &str)
        -> Result<Selection, error::Service>;

    async fn clear_selection(&self, token: &Token) -> Result<Selection, error::Service>;
}

#[async_trait]
impl<T: Service + ?Sized> Service for Arc<T> {
    async fn verify(&self, token: &Token) -> Verification {
        (**self).verify(token).await
    }

    async fn fetch_selection(&self, token: &Token) -> Result<Selection, error::Service> {
        (**self).fetch_selection(token).await
    }

    async fn add_course(&self, token: &Token, code: &str) -> Result<Selection, error::Service> {
        (**self).add_course(token, code).await
    }

    async fn remove_course(
        &self,
        token: &Token,
        code: &str,
    ) -> Result<Selection, error::Service> {
        (**self).remove_course(token, code).await
    }

    async fn clear_selection(&self, token: &Token) -> Result<Selection, error::Service> {
        (**self).clear_selection(token).await
    }
}
