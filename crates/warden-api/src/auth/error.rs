// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token lifecycle error types.

use thiserror::Error;

/// Result type alias for token operations.
pub type TokenResult<T> = Result<T, TokenError>;

/// Errors produced by the token service.
///
/// Every variant except [`TokenError::Signing`] is an authentication failure
/// and maps to HTTP 401.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token could not be parsed.
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// The token's expiry has passed.
    #[error("Token has expired")]
    Expired,

    /// The signature does not verify against the signing key.
    #[error("Token signature is invalid")]
    SignatureInvalid,

    /// The token's `jti` is in the revocation store.
    #[error("Token has been revoked")]
    Revoked,

    /// The revocation check could not complete.
    #[error("Revocation store unavailable: {0}")]
    StoreUnavailable(String),

    /// The token could not be signed.
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl TokenError {
    /// Returns the error code for categorization.
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenError::Malformed(_) => "MALFORMED_TOKEN",
            TokenError::Expired => "EXPIRED_TOKEN",
            TokenError::SignatureInvalid => "SIGNATURE_INVALID",
            TokenError::Revoked => "REVOKED_TOKEN",
            TokenError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            TokenError::Signing(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns `true` if a caller may retry the same token later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TokenError::StoreUnavailable(_))
    }
}

impl From<StoreError> for TokenError {
    fn from(err: StoreError) -> Self {
        TokenError::StoreUnavailable(err.to_string())
    }
}

/// Errors produced by a revocation store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The backend answered with an error.
    #[error("backend error: {0}")]
    Backend(String),

    /// The lookup did not complete in time.
    #[error("lookup timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() || err.is_io_error() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Backend(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_codes() {
        assert_eq!(TokenError::Revoked.error_code(), "REVOKED_TOKEN");
        assert_eq!(TokenError::Expired.error_code(), "EXPIRED_TOKEN");
        assert_eq!(TokenError::Malformed("x".into()).error_code(), "MALFORMED_TOKEN");
    }

    #[test]
    fn test_store_error_fails_closed() {
        let err: TokenError = StoreError::Timeout(Duration::from_millis(50)).into();
        assert!(matches!(err, TokenError::StoreUnavailable(_)));
        assert!(err.is_retryable());
        assert!(!TokenError::Revoked.is_retryable());
    }
}
