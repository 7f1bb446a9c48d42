// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers for all endpoints.
//!
//! - [`auth`]: token lifecycle
//! - [`health`]: liveness
//! - [`users`]: principal profiles
//! - [`admin`]: policy inspection

mod admin;
mod auth;
mod health;
mod users;

pub use admin::*;
pub use auth::*;
pub use health::*;
pub use users::*;
