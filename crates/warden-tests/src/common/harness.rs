// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # In-Process Test Harness
//!
//! Drives the full router with `tower::ServiceExt::oneshot`, so requests
//! pass through the same middleware stack as a bound server without
//! opening a socket.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use warden_api::{
    ApiServer, AppState, ClaimsCodec, InMemoryDirectory, MemoryRevocationStore, PolicyEngine,
    PolicyTable, Principal, RevocationStore, TokenService,
};

use super::assertions::TestResponse;
use super::fixtures::{ConfigFixtures, PolicyFixtures, PrincipalFixtures};

/// Upper bound on buffered response bodies.
const MAX_BODY: usize = 1024 * 1024;

// =============================================================================
// TestApp
// =============================================================================

/// A fully wired application backed by fixture principals and policies.
pub struct TestApp {
    router: Router,
    state: AppState,
    store: Arc<dyn RevocationStore>,
}

impl TestApp {
    /// Creates an app with a memory store and the fixture policy tables.
    pub async fn new() -> Self {
        Self::builder().build().await
    }

    /// Returns a builder.
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder::default()
    }

    /// Returns a fresh router over the same state.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Returns the application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Returns the token service.
    pub fn tokens(&self) -> &TokenService {
        self.state.tokens()
    }

    /// Returns the revocation store.
    pub fn store(&self) -> &Arc<dyn RevocationStore> {
        &self.store
    }

    /// Sends a request and buffers the response.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("request should build");
        self.send(request).await
    }

    /// Sends a prepared request and buffers the response.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        send_to(self.router(), request).await
    }

    /// Sends a GET request.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    /// Logs in and returns the issued token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/auth/tokens",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        response.assert_status(200);
        response.str_field("token").to_string()
    }

    /// Logs in as the fixture admin.
    pub async fn login_admin(&self) -> String {
        self.login(PrincipalFixtures::ADMIN_EMAIL, PrincipalFixtures::PASSWORD)
            .await
    }

    /// Logs in as the fixture member.
    pub async fn login_member(&self) -> String {
        self.login(PrincipalFixtures::MEMBER_EMAIL, PrincipalFixtures::PASSWORD)
            .await
    }

    /// Mints a token directly, bypassing the login endpoint.
    pub fn mint(&self, principal: &Principal) -> String {
        self.tokens()
            .issue(principal)
            .expect("issuing should succeed")
            .token
    }
}

/// Sends a request to any router and buffers the response.
pub async fn send_to(router: Router, request: Request<Body>) -> TestResponse {
    let response = router.oneshot(request).await.expect("router is infallible");

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), MAX_BODY)
        .await
        .expect("body should buffer");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Builds a GET request carrying an optional bearer token.
pub fn bearer_get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request should build")
}

// =============================================================================
// TestAppBuilder
// =============================================================================

/// Builder for [`TestApp`].
#[derive(Default)]
pub struct TestAppBuilder {
    store: Option<Arc<dyn RevocationStore>>,
    store_timeout: Option<Duration>,
    app: Option<PolicyTable>,
    resource: Option<PolicyTable>,
}

impl TestAppBuilder {
    /// Uses the given revocation store.
    pub fn store(mut self, store: Arc<dyn RevocationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Bounds every store call.
    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = Some(timeout);
        self
    }

    /// Replaces the app-scope table.
    pub fn app_policy(mut self, table: PolicyTable) -> Self {
        self.app = Some(table);
        self
    }

    /// Replaces the resource-scope table.
    pub fn resource_policy(mut self, table: PolicyTable) -> Self {
        self.resource = Some(table);
        self
    }

    /// Builds the app.
    pub async fn build(self) -> TestApp {
        super::init_test_logging();

        let config = ConfigFixtures::api_config();
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryRevocationStore::new()));
        let timeout = self.store_timeout.unwrap_or(config.revocation.timeout);

        let codec = ClaimsCodec::new(config.jwt.clone()).expect("fixture secret is valid");
        let tokens = TokenService::new(codec, store.clone()).with_store_timeout(timeout);

        let policy = PolicyEngine::from_tables(
            self.app.unwrap_or_else(PolicyFixtures::app),
            self.resource.unwrap_or_else(PolicyFixtures::resource),
        )
        .await
        .expect("fixture policies should load");

        let directory = InMemoryDirectory::from_seeds(config.principals.clone())
            .expect("fixture principals should seed");

        let state = AppState::builder()
            .config(config)
            .tokens(tokens)
            .policy(policy)
            .directory(Arc::new(directory))
            .build()
            .expect("state should build");

        let router = ApiServer::new(state.clone()).router();

        TestApp {
            router,
            state,
            store,
        }
    }
}
