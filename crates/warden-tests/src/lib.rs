// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden Integration Tests
//!
//! Shared utilities plus the integration suites for the warden workspace.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: principals, policy tables and configuration
//!   - `mocks`: revocation stores with injected failures
//!   - `harness`: an in-process app driven through `tower::ServiceExt::oneshot`
//!   - `assertions`: response assertions
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p warden-tests
//! cargo test -p warden-tests --test integration_lifecycle
//! cargo test -p warden-tests --test integration_access
//! cargo test -p warden-tests --test integration_policy
//! cargo test -p warden-tests --test integration_config
//! ```
//!
//! ## Test Categories
//!
//! ### Lifecycle (`integration_lifecycle.rs`)
//! - Login, validate, refresh, revoke over HTTP
//! - Exactly-once refresh under concurrency
//! - Constant-shape credential failures
//!
//! ### Access tiers (`integration_access.rs`)
//! - Public, internal and private routes
//! - Denied requests never reach the handler
//! - Revocation store timeouts and failures reject the request
//!
//! ### Policy (`integration_policy.rs`)
//! - Deny-by-default and determinism (proptest)
//! - CSV sources with role inheritance
//!
//! ### Config (`integration_config.rs`)
//! - YAML/TOML/JSON loading through `warden-bin`
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use warden_tests::common::{TestApp, PrincipalFixtures};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let app = TestApp::builder().build().await;
//!     let token = app.login(PrincipalFixtures::MEMBER_EMAIL, PrincipalFixtures::PASSWORD).await;
//!     let response = app.get("/user/2", Some(&token)).await;
//!     response.assert_status(200);
//! }
//! ```

#![allow(dead_code)]

pub mod common;
