// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use url::Url;

pub const DEFAULT_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_NOTICE_WINDOW: Duration = Duration::from_secs(5);

/// What to conclude when the identity check fails without saying whether the
/// token is valid, and no user has been verified for that token yet.
///
/// A user already verified for the stored token stays authenticated under
/// either policy. Neither policy deletes the stored token.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AmbiguousAuthPolicy {
    /// Treat the session as authenticated. This favors availability: a
    /// network blip does not lock out someone holding a token, at the cost of
    /// granting access on a token the service may later reject.
    #[default]
    FailOpen,
    /// Treat the session as unauthenticated until the service answers.
    FailClosed,
}

#[derive(Clone, Debug)]
pub struct Config {
    base_url: Url,
    timeout: Duration,
    ambiguous_auth: AmbiguousAuthPolicy,
    notice_window: Duration,
}

impl Config {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            ambiguous_auth: AmbiguousAuthPolicy::FailOpen,
            notice_window: DEFAULT_NOTICE_WINDOW,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_ambiguous_auth_policy(mut self, policy: AmbiguousAuthPolicy) -> Self {
        self.ambiguous_auth = policy;
        self
    }

    /// How long a rejected selection change stays on screen.
    #[must_use]
    pub fn with_notice_window(mut self, window: Duration) -> Self {
        self.notice_window = window;
        self
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub const fn ambiguous_auth_policy(&self) -> AmbiguousAuthPolicy {
        self.ambiguous_auth
    }

    #[must_use]
    pub const fn notice_window(&self) -> Duration {
        self.notice_window
    }
}
