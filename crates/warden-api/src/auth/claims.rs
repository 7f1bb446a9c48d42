// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT claims structure.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Principal;

/// JWT claims for authentication.
///
/// A snapshot of the principal at issuance plus the token's validity window
/// and its unique identifier. The `jti` is the revocation key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    // =========================================================================
    // Standard JWT Claims (RFC 7519)
    // =========================================================================
    /// Subject: the principal's UUID.
    pub sub: Uuid,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at time (Unix timestamp).
    pub iat: i64,

    /// Issuer.
    pub iss: String,

    /// JWT ID.
    pub jti: String,

    // =========================================================================
    // Principal Snapshot
    // =========================================================================
    /// Numeric principal id.
    pub uid: i64,

    /// Principal email.
    pub email: String,

    /// Principal display name.
    pub name: String,

    /// Role at issuance.
    pub role: String,
}

impl Claims {
    /// Creates fresh claims for a principal with a new `jti`.
    pub fn for_principal(principal: &Principal, issuer: impl Into<String>, lifetime_secs: i64) -> Self {
        let now = Utc::now().timestamp();

        Self {
            sub: principal.uuid,
            exp: now + lifetime_secs,
            iat: now,
            iss: issuer.into(),
            jti: Uuid::now_v7().to_string(),
            uid: principal.id,
            email: principal.email.clone(),
            name: principal.name.clone(),
            role: principal.role.clone(),
        }
    }

    /// Rebuilds the principal snapshot carried by these claims.
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.uid,
            uuid: self.sub,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role.clone(),
        }
    }

    /// Returns `true` if the token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Returns the issued at time as a DateTime.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    /// Returns the time remaining until expiration, zero once expired.
    pub fn remaining_lifetime(&self) -> Duration {
        let now = Utc::now().timestamp();
        Duration::from_secs(self.exp.saturating_sub(now).max(0) as u64)
    }
}

// =============================================================================
// Tests
// =============================================================================
