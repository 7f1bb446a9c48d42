// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use crate::auth::{ClaimsCodec, MemoryRevocationStore, TokenService};
use crate::config::ApiConfig;
use crate::directory::{InMemoryDirectory, PrincipalDirectory};
use crate::error::{ApiError, ApiResult};
use crate::middleware::AccessGuard;
use crate::policy::PolicyEngine;

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// Everything here is either immutable after startup (configuration, signing
/// key, policy tables) or internally synchronized (revocation store,
/// directory).
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Token lifecycle service.
    pub tokens: TokenService,
    /// Policy evaluators for both domains.
    pub policy: PolicyEngine,
    /// Principal lookup.
    pub directory: Arc<dyn PrincipalDirectory>,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the token service.
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Returns the policy engine.
    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    /// Returns the principal directory.
    pub fn directory(&self) -> &dyn PrincipalDirectory {
        self.directory.as_ref()
    }

    /// Returns an access guard bound to this state's token service and
    /// policy engine.
    pub fn guard(&self) -> AccessGuard {
        AccessGuard::new(self.tokens.clone(), self.policy.clone())
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tokens", &self.tokens)
            .field("policy", &self.policy)
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    tokens: Option<TokenService>,
    policy: Option<PolicyEngine>,
    directory: Option<Arc<dyn PrincipalDirectory>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the token service.
    pub fn tokens(mut self, tokens: TokenService) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Sets the policy engine.
    pub fn policy(mut self, policy: PolicyEngine) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Sets the principal directory.
    pub fn directory(mut self, directory: Arc<dyn PrincipalDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Builds the AppState.
    ///
    /// Without an explicit token service, one is built from the JWT
    /// configuration over an in-memory revocation store. A policy engine is
    /// required.
    pub fn build(self) -> ApiResult<AppState> {
        let config = self.config.unwrap_or_default();

        let tokens = match self.tokens {
            Some(tokens) => tokens,
            None => {
                let codec = ClaimsCodec::new(config.jwt.clone())?;
                TokenService::new(codec, Arc::new(MemoryRevocationStore::new()))
                    .with_store_timeout(config.revocation.timeout)
            }
        };

        let policy = self
            .policy
            .ok_or_else(|| ApiError::internal("policy engine not configured"))?;

        let directory = self
            .directory
            .unwrap_or_else(|| Arc::new(InMemoryDirectory::new()));

        Ok(AppState {
            config: Arc::new(config),
            tokens,
            policy,
            directory,
        })
    }
}

// =============================================================================
// FromRef implementations for extracting parts of state
// =============================================================================

impl axum::extract::FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl axum::extract::FromRef<AppState> for PolicyEngine {
    fn from_ref(state: &AppState) -> Self {
        state.policy.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<ApiConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
