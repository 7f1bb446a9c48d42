// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Access Tier Integration Tests
//!
//! Public, internal and private routes, the fail-closed revocation lookup,
//! and the guarantee that refused requests never reach a handler.
//!
//! ## Test Categories
//!
//! - `test_public_*`: Public tier
//! - `test_internal_*`: Single-domain protected routes
//! - `test_private_*`: Two-domain protected routes
//! - `test_store_*`: Revocation store failure handling
//! - `test_guard_*`: Handler isolation behind the guard

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use serde_json::json;

use warden_api::{
    AccessLayer, PolicyEngine, PolicyError, PolicyEvaluator, PolicyTable, Requirement,
};
use warden_tests::common::*;

/// A router with one route whose handler counts invocations.
fn counting_route(layer: AccessLayer) -> (Router, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let router = Router::new()
        .route(
            "/guarded",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    "reached"
                }
            }),
        )
        .route_layer(layer);

    (router, hits)
}

// =============================================================================
// Public tier
// =============================================================================

#[tokio::test]
async fn test_public_health_needs_no_token() {
    let app = TestApp::new().await;

    let response = app.get("/health", None).await;

    response.assert_status(200);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["revocation_backend"], "memory");
}

#[tokio::test]
async fn test_public_ignores_garbage_token() {
    let app = TestApp::new().await;

    app.get("/health", Some("garbage")).await.assert_status(200);
}

#[tokio::test]
async fn test_public_guard_skips_store() {
    let store = MockRevocationStore::new();
    let app = TestApp::builder().store(store.clone()).build().await;
    let (router, hits) = counting_route(app.state().guard().public());

    send_to(router, bearer_get("/guarded", None))
        .await
        .assert_status(200);

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(store.exists_count(), 0);
}

// =============================================================================
// Internal tier
// =============================================================================

#[tokio::test]
async fn test_internal_requires_token() {
    let app = TestApp::new().await;

    app.get("/user/2", None)
        .await
        .assert_error(401, "MISSING_TOKEN");
}

#[tokio::test]
async fn test_internal_member_reads_user() {
    let app = TestApp::new().await;
    let token = app.login_member().await;

    let response = app.get("/user/1", Some(&token)).await;

    response.assert_status(200);
    assert_eq!(response.body["email"], PrincipalFixtures::ADMIN_EMAIL);
    assert!(response.body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_internal_member_cannot_write() {
    let app = TestApp::new().await;
    let token = app.login_member().await;

    let response = app
        .request(
            Method::PUT,
            "/user/2",
            Some(&token),
            Some(json!({ "name": "Renamed" })),
        )
        .await;

    response.assert_error(403, "FORBIDDEN").assert_code_only();

    let unchanged = app.get("/user/2", Some(&token)).await;
    assert_eq!(unchanged.body["name"], "Mo Member");
}

#[tokio::test]
async fn test_internal_admin_inherits_read_and_writes() {
    let app = TestApp::new().await;
    let token = app.login_admin().await;

    app.get("/user/2", Some(&token)).await.assert_status(200);

    let response = app
        .request(
            Method::PUT,
            "/user/2",
            Some(&token),
            Some(json!({ "name": "Renamed" })),
        )
        .await;
    response.assert_status(200);
    assert_eq!(response.body["name"], "Renamed");
    assert_eq!(response.body["email"], PrincipalFixtures::MEMBER_EMAIL);
}

#[tokio::test]
async fn test_internal_update_validation() {
    let app = TestApp::new().await;
    let token = app.login_admin().await;

    app.request(Method::PUT, "/user/2", Some(&token), Some(json!({})))
        .await
        .assert_error(400, "BAD_REQUEST");

    app.request(
        Method::PUT,
        "/user/2",
        Some(&token),
        Some(json!({ "email": PrincipalFixtures::ADMIN_EMAIL })),
    )
    .await
    .assert_error(409, "CONFLICT");

    app.request(
        Method::PUT,
        "/user/404",
        Some(&token),
        Some(json!({ "name": "Nobody" })),
    )
    .await
    .assert_error(404, "NOT_FOUND");
}

#[tokio::test]
async fn test_internal_unknown_and_invalid_ids() {
    let app = TestApp::new().await;
    let token = app.login_member().await;

    app.get("/user/999", Some(&token))
        .await
        .assert_error(404, "NOT_FOUND");
    app.get("/user/abc", Some(&token))
        .await
        .assert_error(400, "BAD_REQUEST");
}

#[tokio::test]
async fn test_internal_role_without_rules_is_denied() {
    let app = TestApp::new().await;
    let token = app.mint(&PrincipalFixtures::with_role("contractor"));

    app.get("/user/1", Some(&token))
        .await
        .assert_error(403, "FORBIDDEN");
}

#[tokio::test]
async fn test_internal_rejects_revoked_token() {
    let app = TestApp::new().await;
    let token = app.login_member().await;

    app.request(Method::DELETE, "/auth/tokens", Some(&token), None)
        .await
        .assert_status(204);

    app.get("/user/1", Some(&token))
        .await
        .assert_error(401, "REVOKED_TOKEN");
}

// =============================================================================
// Private tier
// =============================================================================

#[tokio::test]
async fn test_private_admin_sees_both_domains() {
    let app = TestApp::new().await;
    let token = app.login_admin().await;

    let response = app.get("/admin/policies", Some(&token)).await;

    response.assert_status(200);
    assert_eq!(response.body["app"]["domain"], "app");
    assert_eq!(response.body["resource"]["domain"], "resource");
    let roles = response.body["app"]["roles"].as_array().unwrap();
    assert!(roles.iter().any(|r| r == "auditor"));
}

#[tokio::test]
async fn test_private_requires_resource_domain() {
    let app = TestApp::new().await;
    let token = app
        .login(PrincipalFixtures::AUDITOR_EMAIL, PrincipalFixtures::PASSWORD)
        .await;

    // Allowed by the app domain, refused by the resource domain.
    app.get("/admin/policies", Some(&token))
        .await
        .assert_error(403, "FORBIDDEN")
        .assert_code_only();
}

#[tokio::test]
async fn test_private_member_denied() {
    let app = TestApp::new().await;
    let token = app.login_member().await;

    app.get("/admin/policies", Some(&token))
        .await
        .assert_error(403, "FORBIDDEN");
}

#[tokio::test]
async fn test_private_empty_resource_table_denies_everyone() {
    let app = TestApp::builder()
        .resource_policy(PolicyTable::new())
        .build()
        .await;
    let token = app.login_admin().await;

    app.get("/admin/policies", Some(&token))
        .await
        .assert_error(403, "FORBIDDEN");
}

// =============================================================================
// Store failures
// =============================================================================

#[tokio::test]
async fn test_store_timeout_fails_closed() {
    let app = TestApp::builder()
        .store(Arc::new(HangingStore))
        .store_timeout(Duration::from_millis(50))
        .build()
        .await;
    let token = app.mint(&PrincipalFixtures::with_role("admin"));
    let (router, hits) = counting_route(
        app.state()
            .guard()
            .internal(vec![Requirement::app("users", "read")]),
    );

    let response = tokio::time::timeout(
        Duration::from_secs(2),
        send_to(router, bearer_get("/guarded", Some(&token))),
    )
    .await
    .expect("guard should give up on the store");

    response.assert_error(401, "STORE_UNAVAILABLE");
    assert_eq!(
        response.headers.get("retry-after").and_then(|v| v.to_str().ok()),
        Some("1")
    );
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_store_failure_fails_closed() {
    let store = MockRevocationStore::new();
    let app = TestApp::builder().store(store.clone()).build().await;
    let token = app.login_admin().await;

    store.set_failing(true);

    app.get("/user/1", Some(&token))
        .await
        .assert_error(401, "STORE_UNAVAILABLE");
    app.get("/auth/tokens/validate", Some(&token))
        .await
        .assert_error(401, "STORE_UNAVAILABLE");

    store.set_failing(false);
    app.get("/user/1", Some(&token)).await.assert_status(200);
}

#[tokio::test]
async fn test_store_slow_but_within_timeout() {
    let store = MockRevocationStore::new();
    store.set_latency(Duration::from_millis(10));
    let app = TestApp::builder()
        .store(store.clone())
        .store_timeout(Duration::from_millis(500))
        .build()
        .await;
    let token = app.mint(&PrincipalFixtures::with_role("member"));

    app.get("/user/1", Some(&token)).await.assert_status(200);
    assert_eq!(store.exists_count(), 1);
}

// =============================================================================
// Guard isolation
// =============================================================================

#[tokio::test]
async fn test_guard_denied_request_never_reaches_handler() {
    let app = TestApp::new().await;
    let token = app.login_member().await;
    let (router, hits) = counting_route(
        app.state()
            .guard()
            .internal(vec![Requirement::app("users", "write")]),
    );

    send_to(router, bearer_get("/guarded", Some(&token)))
        .await
        .assert_error(403, "FORBIDDEN");

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_guard_without_requirements_admits_nobody() {
    let app = TestApp::builder()
        .app_policy(PolicyTable::new())
        .resource_policy(PolicyTable::new())
        .build()
        .await;
    let token = app.mint(&PrincipalFixtures::with_role("nobody"));

    for layer in [
        app.state().guard().internal(vec![]),
        app.state().guard().private(vec![]),
    ] {
        let (router, hits) = counting_route(layer);

        send_to(router, bearer_get("/guarded", Some(&token)))
            .await
            .assert_error(403, "FORBIDDEN")
            .assert_code_only();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn test_guard_checks_every_requirement() {
    let app = TestApp::new().await;
    let token = app.login_admin().await;
    let (router, hits) = counting_route(app.state().guard().private(vec![
        Requirement::app("users", "read"),
        Requirement::resource("users", "delete"),
    ]));

    send_to(router, bearer_get("/guarded", Some(&token)))
        .await
        .assert_error(403, "FORBIDDEN");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_guard_admits_and_reaches_handler_once() {
    let app = TestApp::new().await;
    let token = app.login_admin().await;
    let (router, hits) = counting_route(app.state().guard().private(vec![
        Requirement::app("policies", "read"),
        Requirement::resource("policy-tables", "anything"),
    ]));

    send_to(router, bearer_get("/guarded", Some(&token)))
        .await
        .assert_status(200);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[derive(Debug)]
struct BrokenEvaluator;

impl PolicyEvaluator for BrokenEvaluator {
    fn evaluate(&self, _role: &str, _resource: &str, _action: &str) -> Result<bool, PolicyError> {
        Err(PolicyError::Eval("matcher blew up".into()))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

#[tokio::test]
async fn test_guard_evaluation_error_is_opaque_500() {
    let app = TestApp::new().await;
    let token = app.login_admin().await;

    let broken: Arc<dyn PolicyEvaluator> = Arc::new(BrokenEvaluator);
    let guard = warden_api::AccessGuard::new(
        app.tokens().clone(),
        PolicyEngine::new(broken.clone(), broken),
    );
    let (router, hits) = counting_route(guard.internal(vec![Requirement::app("users", "read")]));

    let response = send_to(router, bearer_get("/guarded", Some(&token))).await;

    response
        .assert_error(500, "POLICY_EVAL_FAILED")
        .assert_code_only();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}
