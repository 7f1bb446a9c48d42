// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token lifecycle service.
//!
//! Validation always runs in this order:
//!
//! 1. parse the token without verification to obtain its `jti`
//! 2. look the `jti` up in the revocation store
//! 3. only if it is not revoked, verify signature and expiry
//!
//! A revocation lookup that errors or exceeds the configured timeout
//! rejects the token with [`TokenError::StoreUnavailable`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{Claims, ClaimsCodec, Principal, RevocationStore, StoreError, TokenError, TokenResult};

/// Default bound on a single revocation store round trip.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(250);

// =============================================================================
// IssuedToken
// =============================================================================

/// A freshly signed token together with its claims.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    /// The compact signed token.
    pub token: String,
    /// The claims embedded in the token.
    pub claims: Claims,
}

impl IssuedToken {
    /// Returns the expiry of the token.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims.expires_at()
    }
}

// =============================================================================
// TokenService
// =============================================================================

/// Issues, validates, refreshes, and revokes bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    codec: ClaimsCodec,
    store: Arc<dyn RevocationStore>,
    store_timeout: Duration,
}

impl TokenService {
    /// Creates a new token service.
    pub fn new(codec: ClaimsCodec, store: Arc<dyn RevocationStore>) -> Self {
        Self {
            codec,
            store,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Sets the revocation store timeout.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Returns the claims codec.
    pub fn codec(&self) -> &ClaimsCodec {
        &self.codec
    }

    /// Returns the revocation store.
    pub fn store(&self) -> &Arc<dyn RevocationStore> {
        &self.store
    }

    /// Mints a signed token with a fresh `jti` for the principal.
    pub fn issue(&self, principal: &Principal) -> TokenResult<IssuedToken> {
        let claims = Claims::for_principal(principal, self.codec.issuer(), self.codec.expiration_secs());
        let token = self.codec.encode(&claims)?;

        info!(
            principal_id = principal.id,
            role = %principal.role,
            jti = %claims.jti,
            "Token issued"
        );

        Ok(IssuedToken { token, claims })
    }

    /// Extracts claims without verifying signature or expiry.
    pub fn parse_unverified(&self, token: &str) -> TokenResult<Claims> {
        self.codec.decode_unverified(token)
    }

    /// Fully validates a token.
    pub async fn validate(&self, token: &str) -> TokenResult<Claims> {
        let unverified = self.parse_unverified(token).inspect_err(|e| {
            debug!(error = %e, "Rejected unparseable token");
        })?;

        if self.is_revoked(&unverified.jti).await? {
            debug!(jti = %unverified.jti, "Rejected revoked token");
            return Err(TokenError::Revoked);
        }

        let claims = self.codec.verify(token).inspect_err(|e| {
            debug!(jti = %unverified.jti, error = %e, "Rejected token");
        })?;

        Ok(claims)
    }

    /// Exchanges a valid token for a new one, revoking the old `jti`.
    ///
    /// Concurrent refreshes of the same token produce exactly one new token;
    /// the others fail with [`TokenError::Revoked`].
    ///
    /// If the claim on the old `jti` times out, the write may still have
    /// reached the store. The caller then sees `StoreUnavailable` while the
    /// old token is already revoked and the new one was never returned; the
    /// principal has to log in again.
    pub async fn refresh(&self, token: &str) -> TokenResult<IssuedToken> {
        let old = self.validate(token).await?;

        let issued = self.issue(&old.principal())?;

        let ttl = self.revocation_ttl(&old);
        let claimed = self
            .bounded(self.store.put_if_absent(&old.jti, ttl))
            .await?;

        if !claimed {
            debug!(jti = %old.jti, "Refresh lost race for token");
            return Err(TokenError::Revoked);
        }

        info!(old_jti = %old.jti, new_jti = %issued.claims.jti, "Token refreshed");
        Ok(issued)
    }

    /// Revokes a token id for the maximum possible token lifetime.
    pub async fn revoke(&self, jti: &str) -> TokenResult<()> {
        let ttl = self.codec.max_token_lifetime();
        self.bounded(self.store.put(jti, ttl)).await?;

        info!(jti, ttl_secs = ttl.as_secs(), "Token revoked");
        Ok(())
    }

    /// Revokes a token for exactly its remaining lifetime plus leeway.
    pub async fn revoke_claims(&self, claims: &Claims) -> TokenResult<()> {
        let ttl = self.revocation_ttl(claims);
        self.bounded(self.store.put(&claims.jti, ttl)).await?;

        info!(jti = %claims.jti, ttl_secs = ttl.as_secs(), "Token revoked");
        Ok(())
    }

    /// Returns `true` if the token id is revoked.
    pub async fn is_revoked(&self, jti: &str) -> TokenResult<bool> {
        self.bounded(self.store.exists(jti)).await
    }

    fn revocation_ttl(&self, claims: &Claims) -> Duration {
        claims.remaining_lifetime() + self.codec.leeway()
    }

    /// Runs a store operation under the configured timeout.
    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, StoreError>>,
    ) -> TokenResult<T> {
        let result = match tokio::time::timeout(self.store_timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.store_timeout)),
        };

        result.map_err(|e| {
            warn!(backend = self.store.backend(), error = %e, "Revocation store unavailable");
            TokenError::from(e)
        })
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("codec", &self.codec)
            .field("store", &self.store.backend())
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
