// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Access-tier middleware.
//!
//! Each protected route runs the same pipeline:
//!
//! ```text
//! Unauthenticated ─► TokenExtracted ─► TokenValidated ─► Authorized ─► Admitted
//!        │                 │                 │                │
//!        └─────────────────┴─────────────────┴────────────────┴──► Rejected
//! ```
//!
//! Public routes are admitted directly. Internal and Private routes both
//! require a valid bearer token and every route requirement to be allowed by
//! its policy domain. The identity is published into the request extensions
//! only on admission.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{header, HeaderMap, Request},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower::{Layer, Service};
use tracing::{debug, trace, warn};

use crate::auth::{Identity, TokenService};
use crate::error::ApiError;
use crate::policy::{PolicyEngine, PolicyScope};

// =============================================================================
// AccessTier
// =============================================================================

/// Protection level of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    /// No identity required.
    Public,
    /// Any authenticated principal whose role satisfies the requirements.
    Internal,
    /// Administrative routes; same pipeline, typically stricter requirements.
    Private,
}

impl AccessTier {
    /// Returns the tier name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessTier::Public => "public",
            AccessTier::Internal => "internal",
            AccessTier::Private => "private",
        }
    }
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Requirement
// =============================================================================

/// A single policy check a route demands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requirement {
    /// Policy domain to consult.
    pub scope: PolicyScope,
    /// Resource name.
    pub resource: String,
    /// Action name.
    pub action: String,
}

impl Requirement {
    /// Creates a requirement in the given scope.
    pub fn new(scope: PolicyScope, resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            scope,
            resource: resource.into(),
            action: action.into(),
        }
    }

    /// Creates an app-scope requirement.
    pub fn app(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(PolicyScope::App, resource, action)
    }

    /// Creates a resource-scope requirement.
    pub fn resource(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(PolicyScope::Resource, resource, action)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.scope, self.resource, self.action)
    }
}

// =============================================================================
// AccessState
// =============================================================================

/// Pipeline states, used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    /// Nothing inspected yet.
    Unauthenticated,
    /// A bearer token was found.
    TokenExtracted,
    /// The token passed revocation and signature checks.
    TokenValidated,
    /// Every requirement was allowed.
    Authorized,
    /// The identity was published and the handler may run.
    Admitted,
    /// The request was refused.
    Rejected,
}

// =============================================================================
// Bearer extraction
// =============================================================================

/// Extracts the bearer token from the `Authorization` header.
///
/// A missing header or an empty bearer credential yields
/// [`ApiError::MissingToken`]; a header that is not a bearer credential
/// yields [`ApiError::MissingHeader`].
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::MissingToken)?;

    let value = value
        .to_str()
        .map_err(|_| ApiError::missing_header("authorization header is not valid ASCII"))?
        .trim();

    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::missing_header("authorization scheme is not Bearer"));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::MissingToken);
    }
    Ok(token)
}

// =============================================================================
// AccessPipeline
// =============================================================================

/// The per-route admission pipeline shared by every middleware instance.
#[derive(Clone)]
pub struct AccessPipeline {
    tier: AccessTier,
    requirements: Arc<[Requirement]>,
    tokens: TokenService,
    policy: PolicyEngine,
}

impl AccessPipeline {
    /// Creates a pipeline.
    pub fn new(
        tier: AccessTier,
        requirements: Vec<Requirement>,
        tokens: TokenService,
        policy: PolicyEngine,
    ) -> Self {
        Self {
            tier,
            requirements: requirements.into(),
            tokens,
            policy,
        }
    }

    /// Returns the tier.
    pub fn tier(&self) -> AccessTier {
        self.tier
    }

    /// Returns the route requirements.
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Runs the pipeline against the request headers.
    ///
    /// Returns `Ok(None)` for public routes and `Ok(Some(identity))` for
    /// admitted protected routes.
    pub async fn admit(&self, headers: &HeaderMap) -> Result<Option<Identity>, ApiError> {
        let tier = self.tier;
        trace!(%tier, state = ?AccessState::Unauthenticated, "Access pipeline started");

        if tier == AccessTier::Public {
            trace!(%tier, state = ?AccessState::Admitted, "Public route admitted");
            return Ok(None);
        }

        let token = bearer_token(headers).inspect_err(|e| {
            debug!(%tier, state = ?AccessState::Rejected, code = e.error_code(), "No usable bearer token");
        })?;
        trace!(%tier, state = ?AccessState::TokenExtracted, "Bearer token extracted");

        let claims = self.tokens.validate(token).await.inspect_err(|e| {
            debug!(%tier, state = ?AccessState::Rejected, code = e.error_code(), "Token rejected");
        })?;
        trace!(%tier, state = ?AccessState::TokenValidated, jti = %claims.jti, "Token validated");

        // A protected route with nothing to evaluate has no rule that allows it.
        if self.requirements.is_empty() {
            warn!(
                %tier,
                state = ?AccessState::Rejected,
                principal_id = claims.uid,
                role = %claims.role,
                "Protected route declares no requirements"
            );
            return Err(ApiError::forbidden("no requirements declared"));
        }

        for requirement in self.requirements.iter() {
            let allowed = self
                .policy
                .evaluate(
                    requirement.scope,
                    &claims.role,
                    &requirement.resource,
                    &requirement.action,
                )
                .map_err(|e| {
                    warn!(
                        %tier,
                        state = ?AccessState::Rejected,
                        %requirement,
                        error = %e,
                        "Policy evaluation failed"
                    );
                    ApiError::from(e)
                })?;

            if !allowed {
                warn!(
                    %tier,
                    state = ?AccessState::Rejected,
                    principal_id = claims.uid,
                    role = %claims.role,
                    %requirement,
                    "Policy denied request"
                );
                return Err(ApiError::forbidden(requirement.to_string()));
            }
        }
        trace!(%tier, state = ?AccessState::Authorized, role = %claims.role, "Request authorized");

        Ok(Some(Identity::from_claims(claims)))
    }
}

impl fmt::Debug for AccessPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessPipeline")
            .field("tier", &self.tier)
            .field("requirements", &self.requirements)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// AccessLayer
// =============================================================================

/// Layer applying an access tier to the wrapped routes.
#[derive(Debug, Clone)]
pub struct AccessLayer {
    pipeline: AccessPipeline,
}

impl AccessLayer {
    /// Creates a layer from a pipeline.
    pub fn new(pipeline: AccessPipeline) -> Self {
        Self { pipeline }
    }

    /// Returns the pipeline.
    pub fn pipeline(&self) -> &AccessPipeline {
        &self.pipeline
    }
}

impl<S> Layer<S> for AccessLayer {
    type Service = AccessMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessMiddleware {
            inner,
            pipeline: self.pipeline.clone(),
        }
    }
}

// =============================================================================
// AccessMiddleware
// =============================================================================

/// Middleware running the access pipeline before the inner service.
#[derive(Debug, Clone)]
pub struct AccessMiddleware<S> {
    inner: S,
    pipeline: AccessPipeline,
}

impl<S> Service<Request<Body>> for AccessMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let pipeline = self.pipeline.clone();
        // The clone may not be ready; swap so the readied service handles this call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match pipeline.admit(req.headers()).await {
                Ok(identity) => {
                    if let Some(identity) = identity {
                        req.extensions_mut().insert(identity);
                    }
                    trace!(tier = %pipeline.tier(), state = ?AccessState::Admitted, "Request admitted");
                    inner.call(req).await
                }
                Err(e) => Ok(e.into_response()),
            }
        })
    }
}

// =============================================================================
// AccessGuard
// =============================================================================

/// Factory for access layers sharing one token service and policy engine.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    tokens: TokenService,
    policy: PolicyEngine,
}

impl AccessGuard {
    /// Creates a guard.
    pub fn new(tokens: TokenService, policy: PolicyEngine) -> Self {
        Self { tokens, policy }
    }

    /// Builds a layer for the given tier.
    pub fn tier(&self, tier: AccessTier, requirements: Vec<Requirement>) -> AccessLayer {
        AccessLayer::new(AccessPipeline::new(
            tier,
            requirements,
            self.tokens.clone(),
            self.policy.clone(),
        ))
    }

    /// Builds a public layer.
    pub fn public(&self) -> AccessLayer {
        self.tier(AccessTier::Public, Vec::new())
    }

    /// Builds an internal layer.
    ///
    /// Every requirement must allow. An empty list admits nobody.
    pub fn internal(&self, requirements: Vec<Requirement>) -> AccessLayer {
        self.tier(AccessTier::Internal, requirements)
    }

    /// Builds a private layer. An empty list admits nobody.
    pub fn private(&self, requirements: Vec<Requirement>) -> AccessLayer {
        self.tier(AccessTier::Private, requirements)
    }
}

// =============================================================================
// Tests
// =============================================================================
