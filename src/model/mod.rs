// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

mod course;
mod identity;
pub(crate) mod wire;

pub use course::{Course, Faculty, Selection, DEFAULT_CAPACITY};
pub use identity::{Token, User};
