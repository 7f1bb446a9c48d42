// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-api
//!
//! Credential lifecycle and access-control pipeline for the warden
//! administrative API.
//!
//! The crate issues, validates, refreshes, and revokes bearer tokens, and
//! arbitrates every protected request against two independent role-based
//! policy domains:
//!
//! - **app scope**: coarse capability gating (`operator` may `write` `users`)
//! - **resource scope**: finer relationships (ownership, membership)
//!
//! ## Request pipeline
//!
//! ```text
//!  request ──► AccessLayer ──► TokenService::validate ──► PolicyEngine::evaluate ──► handler
//!                 │                  │                           │
//!                 │            RevocationStore              app / resource
//!                 ▼              (fail closed)                evaluators
//!             Rejected  ◄────────────┴───────────────────────────┘
//! ```
//!
//! Validation always runs parse-unverified → revocation lookup → full
//! signature/expiry verification. If the revocation lookup cannot complete,
//! the request is rejected.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod policy;
pub mod response;
pub mod server;
pub mod state;

pub use auth::{
    Claims, ClaimsCodec, Identity, IdentityContext, IssuedToken, JwtConfig, MemoryRevocationStore,
    Principal, RedisRevocationStore, RevocationStore, StoreError, TokenError, TokenService,
};
pub use config::ApiConfig;
pub use directory::{
    DirectoryError, InMemoryDirectory, PrincipalDirectory, PrincipalRecord, PrincipalSeed,
    ProfileUpdate,
};
pub use error::{ApiError, ApiResult};
pub use middleware::{AccessGuard, AccessLayer, AccessTier, Requirement};
pub use policy::{
    PolicyEngine, PolicyError, PolicyEvaluator, PolicyRule, PolicyScope, PolicySource, PolicyTable,
};
pub use server::ApiServer;
pub use state::{AppState, AppStateBuilder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
