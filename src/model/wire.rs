// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use super::{Token, User};

/// Body of a successful identity check.
#[derive(Debug, Deserialize)]
pub(crate) struct Welcome {
    pub(crate) uid: Token,
    pub(crate) user_name: String,
    #[serde(default)]
    pub(crate) has_registered_courses: bool,
}

impl From<Welcome> for User {
    fn from(value: Welcome) -> Self {
        Self::new(value.uid, value.user_name).with_registered_courses(value.has_registered_courses)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AddCourse<'code> {
    pub(crate) course_code: &'code str,
}

/// Error body the service attaches to rejected requests. The detail is
/// usually a sentence, but request validation errors carry a structured list.
#[derive(Debug, Deserialize)]
pub(crate) struct Rejection {
    #[serde(default)]
    pub(crate) detail: Option<serde_json::Value>,
}

impl Rejection {
    pub(crate) fn into_message(self) -> Option<String> {
        match self.detail {
            Some(serde_json::Value::String(message)) if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}
