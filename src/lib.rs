// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Client-side session and course-selection state for the university course
//! catalog.
//!
//! [`SessionCache`] decides whether the stored identity token belongs to an
//! authenticated user. [`SelectionSynchronizer`] keeps the selected courses
//! in step with the catalog service, which alone decides what fits within the
//! capacity. Both talk to the service through the [`Service`] trait; hosts
//! wire them to [`service::Http`] and a [`storage::Storage`] backend.

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod error;
mod metadata;
pub mod model;
pub mod selection;
pub mod service;
pub mod session;
pub mod storage;

pub use config::{AmbiguousAuthPolicy, Config};
pub use error::{Error, Result};
pub use selection::{Notice, SelectionSynchronizer};
pub use service::{Service, Verification};
pub use session::{AuthState, Session, SessionCache};
