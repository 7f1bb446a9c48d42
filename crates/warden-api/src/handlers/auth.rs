// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token lifecycle handlers.
//!
//! These routes sit on the public tier and validate the presented bearer
//! token themselves, so every failure maps straight onto a token error code.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;

use crate::directory::authenticate;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{BearerToken, ValidatedJson};
use crate::response::{PrincipalResponse, TokenResponse, ValidationResponse};
use crate::state::AppState;

// =============================================================================
// Issue
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Password.
    pub password: String,
}

/// POST /auth/tokens
///
/// Verifies credentials and issues a token.
pub async fn issue_token(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let principal = authenticate(state.directory(), &request.email, &request.password)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let issued = state.tokens().issue(&principal)?;

    Ok(Json(TokenResponse::from(issued)))
}

// =============================================================================
// Revoke
// =============================================================================

/// DELETE /auth/tokens
///
/// Revokes the presented token. The token must still be valid.
pub async fn revoke_token(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> ApiResult<impl IntoResponse> {
    let claims = state.tokens().validate(&token).await?;
    state.tokens().revoke_claims(&claims).await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Validate
// =============================================================================

/// GET /auth/tokens/validate
pub async fn validate_token(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> ApiResult<impl IntoResponse> {
    let claims = state.tokens().validate(&token).await?;

    Ok(Json(ValidationResponse::valid(claims)))
}

// =============================================================================
// Refresh
// =============================================================================

/// POST /auth/tokens/refresh
///
/// Exchanges a valid token for a fresh one. The presented token is revoked;
/// a second refresh of the same token fails with `REVOKED_TOKEN`.
pub async fn refresh_token(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> ApiResult<impl IntoResponse> {
    let issued = state.tokens().refresh(&token).await?;

    Ok(Json(TokenResponse::from(issued)))
}

// =============================================================================
// Token User
// =============================================================================

/// GET /auth/tokens/user
///
/// Returns the principal the presented token was issued to.
pub async fn token_user(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> ApiResult<impl IntoResponse> {
    let claims = state.tokens().validate(&token).await?;

    Ok(Json(PrincipalResponse::from(claims.principal())))
}
