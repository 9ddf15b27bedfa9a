// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{io, result};

use thiserror::Error;

/// The message shown when the service could not be reached or did not
/// explain why it refused a request.
pub const GENERIC_RETRY_MESSAGE: &str = "Network error. Please try again.";

pub type Result<T, E = Error> = result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("JSON format error: {0}")]
    Json(serde_json::Error),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("storage error: {0}")]
    Storage(#[from] Storage),
    #[error("catalog service error: {0}")]
    Service(#[from] Service),
    #[error("the URL {0} cannot be used as a service base URL")]
    InvalidBaseUrl(url::Url),
    #[error("command execution failed")]
    Command,
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(clippy::wildcard_enum_match_arm)]
        match value.classify() {
            serde_json::error::Category::Io => Self::Io(value.into()),
            _ => Self::Json(value),
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Storage {
    #[error("no project directories are available for this user")]
    NoProjectDirs,
    #[error("stored identity token is unreadable: {0}")]
    Corrupt(serde_json::Error),
}

/// Why the catalog service did not hand back a course selection.
///
/// Only [`Service::ValidationRejected`] carries text written by the service;
/// the other variants carry diagnostic detail for logs, and users see
/// [`GENERIC_RETRY_MESSAGE`] instead.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Service {
    #[error("request rejected: {0}")]
    ValidationRejected(String),
    #[error("transport failure: {0}")]
    TransportFailure(String),
    #[error("unexpected response: {0}")]
    Unknown(String),
}

impl Service {
    /// The text to put in front of a user for this failure.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::ValidationRejected(detail) => detail,
            Self::TransportFailure(_) | Self::Unknown(_) => GENERIC_RETRY_MESSAGE,
        }
    }
}

impl From<reqwest::Error> for Service {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Unknown(value.to_string())
        } else {
            Self::TransportFailure(value.to_string())
        }
    }
}
