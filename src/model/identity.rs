// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize, Serializer};

/// The opaque identifier that represents a logged-in session.
///
/// The value is kept out of `Debug` output so it never ends up in logs.
#[derive(Clone, Debug, Deserialize)]
#[serde(transparent)]
pub struct Token(SecretString);

impl Token {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::new(value.into()))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Token {}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

/// The identity the catalog service confirmed for a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub uid: Token,
    pub name: String,
    pub has_registered_courses: bool,
}

impl User {
    #[must_use]
    pub fn new(uid: Token, name: impl Into<String>) -> Self {
        Self {
            uid,
            name: name.into(),
            has_registered_courses: false,
        }
    }

    #[must_use]
    pub fn with_registered_courses(mut self, has_registered_courses: bool) -> Self {
        self.has_registered_courses = has_registered_courses;
        self
    }

    /// Whether this record was verified for exactly `token`.
    #[must_use]
    pub fn is_for(&self, token: &Token) -> bool {
        self.uid == *token
    }
}
