// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! - [`AccessLayer`]: access-tier gatekeeping (token validation and policy
//!   evaluation), built through an [`AccessGuard`]

mod access;

pub use access::{
    bearer_token, AccessGuard, AccessLayer, AccessMiddleware, AccessPipeline, AccessState,
    AccessTier, Requirement,
};
