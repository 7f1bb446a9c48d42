// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Administrative handlers.

use axum::{extract::State, response::IntoResponse, Json};

use crate::policy::{PolicyEvaluator, PolicyScope};
use crate::response::{PolicyDomainView, PolicyOverview};
use crate::state::AppState;

fn domain_view(evaluator: &dyn PolicyEvaluator) -> PolicyDomainView {
    let table = evaluator.table().cloned();
    PolicyDomainView {
        domain: evaluator.name().to_string(),
        roles: table
            .as_ref()
            .map(|t| t.roles().into_iter().map(String::from).collect())
            .unwrap_or_default(),
        table,
    }
}

/// GET /admin/policies
///
/// Dumps both loaded policy domains.
pub async fn list_policies(State(state): State<AppState>) -> impl IntoResponse {
    let policy = state.policy();

    Json(PolicyOverview {
        app: domain_view(policy.evaluator(PolicyScope::App).as_ref()),
        resource: domain_view(policy.evaluator(PolicyScope::Resource).as_ref()),
    })
}
