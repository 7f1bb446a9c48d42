// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{Claims, Identity, IssuedToken, Principal};
use crate::policy::PolicyTable;

// =============================================================================
// Token Responses
// =============================================================================

/// Body returned when a token is issued or refreshed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The signed bearer token.
    pub token: String,
    /// When the token expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            expires_at: issued.expires_at(),
            token: issued.token,
        }
    }
}

/// Body returned by token validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Always `true`; invalid tokens produce an error body instead.
    pub valid: bool,
    /// When the token was issued.
    pub issued_at: Option<DateTime<Utc>>,
    /// When the token expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// The verified claims.
    pub claims: Claims,
}

impl ValidationResponse {
    /// Creates a response for verified claims.
    pub fn valid(claims: Claims) -> Self {
        Self {
            valid: true,
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
            claims,
        }
    }
}

// =============================================================================
// Principal Response
// =============================================================================

/// Public view of a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalResponse {
    /// Numeric id.
    pub id: i64,
    /// External identifier.
    pub uuid: Uuid,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role.
    pub role: String,
}

impl From<Principal> for PrincipalResponse {
    fn from(p: Principal) -> Self {
        Self {
            id: p.id,
            uuid: p.uuid,
            email: p.email,
            name: p.name,
            role: p.role,
        }
    }
}

impl From<&Identity> for PrincipalResponse {
    fn from(identity: &Identity) -> Self {
        identity.principal().into()
    }
}

// =============================================================================
// Policy Response
// =============================================================================

/// Snapshot of one loaded policy domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDomainView {
    /// Domain name.
    pub domain: String,
    /// Distinct roles the table mentions.
    pub roles: Vec<String>,
    /// The loaded table, when the evaluator exposes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<PolicyTable>,
}

/// Body of the policy inspection route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyOverview {
    /// App-scope domain.
    pub app: PolicyDomainView,
    /// Resource-scope domain.
    pub resource: PolicyDomainView,
}

// =============================================================================
// Health Response
// =============================================================================

/// Health check body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Revocation store backend in use.
    pub revocation_backend: String,
}
