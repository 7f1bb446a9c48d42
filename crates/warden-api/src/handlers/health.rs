// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health check handler.

use axum::{extract::State, response::IntoResponse, Json};

use crate::response::HealthResponse;
use crate::state::AppState;

/// GET /health
///
/// Liveness check. Returns 200 OK while the service is running.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
        revocation_backend: state.tokens().store().backend().to_string(),
    })
}
