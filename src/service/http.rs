// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{RequestBuilder, StatusCode};
use url::Url;

use crate::{
    config::Config,
    error::{self, Result},
    metadata,
    model::{wire, Selection, Token, User},
};

use super::{Service, Verification};

/// The catalog service over HTTP and JSON.
pub struct Http {
    client: reqwest::Client,
    base_url: Url,
}

impl Http {
    /// # Errors
    ///
    /// Fails if the configured URL cannot have paths appended to it or the
    /// HTTP client cannot be initialized.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(metadata::USER_AGENT.as_str())
            .build()?;
        Self::with_client(client, config.base_url().clone())
    }

    /// Uses a caller-provided client, e.g. to share a connection pool.
    ///
    /// # Errors
    ///
    /// Fails if `base_url` cannot have paths appended to it.
    pub fn with_client(client: reqwest::Client, base_url: Url) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(error::Error::InvalidBaseUrl(base_url));
        }
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, error::Service> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                error::Service::Unknown(format!("{} cannot be a base URL", self.base_url))
            })?;
            let _ = path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Sends a request that answers with a full selection snapshot.
    async fn snapshot(&self, request: RequestBuilder) -> Result<Selection, error::Service> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<Selection>().await?);
        }

        if status.is_client_error() {
            if let Some(detail) = response
                .json::<wire::Rejection>()
                .await
                .ok()
                .and_then(wire::Rejection::into_message)
            {
                return Err(error::Service::ValidationRejected(detail));
            }
        }

        Err(error::Service::Unknown(format!(
            "server responded with {status}"
        )))
    }
}

#[async_trait]
impl Service for Http {
    async fn verify(&self, token: &Token) -> Verification {
        let url = match self.endpoint(&["welcome", token.expose()]) {
            Ok(url) => url,
            Err(e) => return Verification::Ambiguous(e.to_string()),
        };

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("We could not reach the identity service: {}", e);
                return Verification::Ambiguous(e.to_string());
            }
        };

        match response.status() {
            status if status.is_success() => match response.json::<wire::Welcome>().await {
                Ok(welcome) => Verification::Confirmed(User::from(welcome)),
                Err(e) => Verification::Ambiguous(format!("unreadable identity response: {e}")),
            },
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
                debug!("The identity service does not recognize the stored token");
                Verification::Rejected
            }
            status => Verification::Ambiguous(format!("server responded with {status}")),
        }
    }

    async fn fetch_selection(&self, token: &Token) -> Result<Selection, error::Service> {
        let url = self.endpoint(&["selected-courses", token.expose()])?;
        self.snapshot(self.client.get(url)).await
    }

    async fn add_course(&self, token: &Token, code: &str) -> Result<Selection, error::Service> {
        let url = self.endpoint(&["selected-courses", token.expose()])?;
        self.snapshot(
            self.client
                .post(url)
                .json(&wire::AddCourse { course_code: code }),
        )
        .await
    }

    async fn remove_course(
        &self,
        token: &Token,
        code: &str,
    ) -> Result<Selection, error::Service> {
        let url = self.endpoint(&["selected-courses", token.expose(), code])?;
        self.snapshot(self.client.delete(url)).await
    }

    async fn clear_selection(&self, token: &Token) -> Result<Selection, error::Service> {
        let url = self.endpoint(&["selected-courses", token.expose()])?;
        self.snapshot(self.client.delete(url)).await
    }
}
