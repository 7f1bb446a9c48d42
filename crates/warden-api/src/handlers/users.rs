// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Principal profile handlers.

use axum::{extract::State, response::IntoResponse, Json};

use crate::directory::ProfileUpdate;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{CurrentIdentity, PrincipalIdPath, ValidatedJson};
use crate::response::PrincipalResponse;
use crate::state::AppState;

/// GET /user/{id}
pub async fn get_user(
    State(state): State<AppState>,
    PrincipalIdPath(id): PrincipalIdPath,
) -> ApiResult<impl IntoResponse> {
    let principal = state
        .directory()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("user {id}")))?;

    Ok(Json(PrincipalResponse::from(principal)))
}

/// PUT /user/{id}
///
/// Absent fields are left unchanged.
pub async fn update_user(
    State(state): State<AppState>,
    CurrentIdentity(caller): CurrentIdentity,
    PrincipalIdPath(id): PrincipalIdPath,
    ValidatedJson(update): ValidatedJson<ProfileUpdate>,
) -> ApiResult<impl IntoResponse> {
    if update.is_empty() {
        return Err(ApiError::bad_request("Nothing to update"));
    }
    if matches!(&update.email, Some(email) if email.trim().is_empty()) {
        return Err(ApiError::bad_request("Email must not be empty"));
    }

    let principal = state.directory().update(id, update).await?;

    tracing::info!(target_id = id, caller_id = caller.id, "Profile updated");

    Ok(Json(PrincipalResponse::from(principal)))
}
