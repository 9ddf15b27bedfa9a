// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// The capacity assumed when the service does not state one.
pub const DEFAULT_CAPACITY: u32 = 3;

const fn default_capacity() -> u32 {
    DEFAULT_CAPACITY
}

/// Who teaches a course. The catalog sends either a bare name or the full
/// contact card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Faculty {
    Name(String),
    Contact {
        name: String,
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        office_hours: Option<String>,
    },
}

impl Faculty {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Contact { name, .. } => name,
        }
    }
}

impl fmt::Display for Faculty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A selected course exactly as the service reported it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Tabled)]
pub struct Course {
    #[tabled(rename = "Code")]
    pub code: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[serde(default)]
    #[tabled(rename = "Credits")]
    pub credits: u32,
    #[serde(default)]
    #[tabled(rename = "Faculty", display_with = "Self::format_faculty")]
    pub faculty: Option<Faculty>,
    #[serde(default)]
    #[tabled(rename = "Major", display_with = "Self::format_optional")]
    pub major: Option<String>,
    #[serde(default)]
    #[tabled(skip)]
    pub description: Option<String>,
}

impl Course {
    fn format_faculty(faculty: &Option<Faculty>) -> String {
        faculty.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    fn format_optional(value: &Option<String>) -> String {
        value.clone().unwrap_or_default()
    }
}

/// One complete, service-confirmed view of the selected courses.
///
/// A selection is only ever replaced wholesale by the next one the service
/// returns; it is never patched locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(rename = "selected_courses", default)]
    courses: Vec<Course>,
    #[serde(rename = "course_limit", default = "default_capacity")]
    capacity: u32,
}

impl Selection {
    #[must_use]
    pub const fn new(courses: Vec<Course>, capacity: u32) -> Self {
        Self { courses, capacity }
    }

    #[must_use]
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    /// The limit the service declared. It is informational only; the service
    /// decides whether an addition fits.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.courses.iter().any(|course| course.code == code)
    }

    #[must_use]
    pub fn total_credits(&self) -> u32 {
        self.courses.iter().map(|course| course.credits).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(vec![], DEFAULT_CAPACITY)
    }
}
