// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom extractors for API handlers.

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::auth::{Identity, IdentityContext};
use crate::error::ApiError;
use crate::middleware::bearer_token;

// =============================================================================
// Identity Extractors
// =============================================================================

/// Extractor for admitted requests.
///
/// Reads the [`Identity`] published by the access pipeline. Returns 401 if
/// the route was not protected or the identity is absent.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentIdentity(me): CurrentIdentity) -> impl IntoResponse {
///     format!("Hello, {}", me.name)
/// }
/// ```
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .identity()
            .cloned()
            .map(CurrentIdentity)
            .ok_or(ApiError::MissingToken)
    }
}

/// Extractor for routes that work with or without an identity.
pub struct OptionalIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalIdentity(parts.identity().cloned()))
    }
}

// =============================================================================
// Bearer Token Extractor
// =============================================================================

/// Extractor for the raw bearer token, for routes that validate it
/// themselves (the token lifecycle endpoints).
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers).map(|token| BearerToken(token.to_string()))
    }
}

// =============================================================================
// Validated JSON Extractor
// =============================================================================

/// Extractor for JSON payloads.
///
/// Extracts and deserializes JSON, returning `BAD_REQUEST` for malformed input.
pub struct ValidatedJson<T>(pub T);

impl<S, T> axum::extract::FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(
        req: axum::http::Request<axum::body::Body>,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

        Ok(ValidatedJson(value))
    }
}

// =============================================================================
// Principal ID Extractor
// =============================================================================

/// Extractor for a numeric principal id from the path.
pub struct PrincipalIdPath(pub i64);

impl<S> FromRequestParts<S> for PrincipalIdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid user id: {}", e)))?;

        raw.parse::<i64>()
            .map(PrincipalIdPath)
            .map_err(|_| ApiError::bad_request(format!("Invalid user id: {raw}")))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Claims, Principal};
    use axum::body::Body;
    use axum::http::{header, Request};
    use uuid::Uuid;

    fn parts_with(identity: Option<Identity>) -> Parts {
        let mut request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer raw-token")
            .body(Body::empty())
            .unwrap();
        if let Some(identity) = identity {
            request.extensions_mut().insert(identity);
        }
        request.into_parts().0
    }

    fn identity() -> Identity {
        let principal = Principal::new(9, Uuid::new_v4(), "n@example.com", "N", "member");
        Identity::from_claims(Claims::for_principal(&principal, "warden", 60))
    }

    #[tokio::test]
    async fn test_current_identity() {
        let mut parts = parts_with(Some(identity()));
        let CurrentIdentity(me) = CurrentIdentity::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(me.id, 9);

        let mut parts = parts_with(None);
        let err = CurrentIdentity::from_request_parts(&mut parts, &()).await.err().unwrap();
        assert_eq!(err.error_code(), "MISSING_TOKEN");
    }

    #[tokio::test]
    async fn test_optional_identity() {
        let mut parts = parts_with(None);
        let OptionalIdentity(me) = OptionalIdentity::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(me.is_none());
    }

    #[tokio::test]
    async fn test_bearer_token() {
        let mut parts = parts_with(None);
        let BearerToken(token) = BearerToken::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(token, "raw-token");
    }
}
