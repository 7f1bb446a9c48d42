// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request-scoped identity context.
//!
//! Once the access pipeline admits a request, it inserts an [`Identity`] into
//! the request extensions. Handlers and later middleware read it through the
//! [`IdentityContext`] accessors, which return `None` rather than failing
//! when no identity has been published.

use std::sync::Arc;

use axum::http::request::Parts;
use axum::http::{Extensions, Request};
use serde::Serialize;
use uuid::Uuid;

use super::{Claims, Principal};

// =============================================================================
// Identity
// =============================================================================

/// The validated identity of the caller.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    /// Numeric principal id.
    pub id: i64,
    /// Stable external identifier.
    pub uuid: Uuid,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role the request was authorized under.
    pub role: String,
    /// The verified claims the identity was derived from.
    #[serde(skip)]
    pub claims: Arc<Claims>,
}

impl Identity {
    /// Builds an identity from verified claims.
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            id: claims.uid,
            uuid: claims.sub,
            email: claims.email.clone(),
            name: claims.name.clone(),
            role: claims.role.clone(),
            claims: Arc::new(claims),
        }
    }

    /// Returns the principal snapshot.
    pub fn principal(&self) -> Principal {
        Principal::new(
            self.id,
            self.uuid,
            self.email.clone(),
            self.name.clone(),
            self.role.clone(),
        )
    }

    /// Returns the token id the identity was issued under.
    pub fn jti(&self) -> &str {
        &self.claims.jti
    }
}

// =============================================================================
// IdentityContext
// =============================================================================

/// Typed accessors over the published identity.
pub trait IdentityContext {
    /// Returns the published identity, if any.
    fn identity(&self) -> Option<&Identity>;

    /// Returns the principal id.
    fn principal_id(&self) -> Option<i64> {
        self.identity().map(|i| i.id)
    }

    /// Returns the principal UUID.
    fn principal_uuid(&self) -> Option<Uuid> {
        self.identity().map(|i| i.uuid)
    }

    /// Returns the principal email.
    fn principal_email(&self) -> Option<&str> {
        self.identity().map(|i| i.email.as_str())
    }

    /// Returns the principal display name.
    fn principal_name(&self) -> Option<&str> {
        self.identity().map(|i| i.name.as_str())
    }

    /// Returns the principal role.
    fn principal_role(&self) -> Option<&str> {
        self.identity().map(|i| i.role.as_str())
    }

    /// Returns the verified token claims.
    fn token_claims(&self) -> Option<&Claims> {
        self.identity().map(|i| i.claims.as_ref())
    }
}

impl IdentityContext for Extensions {
    fn identity(&self) -> Option<&Identity> {
        self.get::<Identity>()
    }
}

impl<B> IdentityContext for Request<B> {
    fn identity(&self) -> Option<&Identity> {
        self.extensions().get::<Identity>()
    }
}

impl IdentityContext for Parts {
    fn identity(&self) -> Option<&Identity> {
        self.extensions.get::<Identity>()
    }
}
