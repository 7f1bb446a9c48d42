// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication module.
//!
//! This module provides:
//! - The principal and claims data model
//! - JWT encoding and decoding ([`ClaimsCodec`])
//! - Revocation stores keyed by `jti`
//! - The token lifecycle service (issue, validate, refresh, revoke)
//! - The request-scoped identity context

mod claims;
mod codec;
mod context;
mod error;
mod principal;
pub mod revocation;
mod service;

pub use claims::Claims;
pub use codec::{ClaimsCodec, JwtConfig};
pub use context::{Identity, IdentityContext};
pub use error::{StoreError, TokenError, TokenResult};
pub use principal::Principal;
pub use revocation::{MemoryRevocationStore, RedisRevocationStore, RevocationStore};
pub use service::{IssuedToken, TokenService};
