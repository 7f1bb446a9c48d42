// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::{AccessGuard, Requirement};
use crate::state::AppState;

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
///
/// This is the main entry point for creating and running the HTTP server.
pub struct ApiServer {
    state: AppState,
    config: Arc<ApiConfig>,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        Self { state, config }
    }

    /// Returns the shared state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Creates the router with all routes and middleware.
    ///
    /// Every route carries exactly one access tier; the guard for a route is
    /// attached with `route_layer` so unmatched paths stay 404.
    pub fn router(&self) -> Router {
        let guard = self.state.guard();

        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.config.request_timeout,
            ))
            .layer(create_cors_layer(&self.config))
            .layer(DefaultBodyLimit::max(self.config.max_body_size));

        Router::new()
            .merge(public_routes(&guard))
            .merge(internal_routes(&guard))
            .merge(private_routes(&guard))
            .layer(middleware_stack)
            .with_state(self.state.clone())
    }

    /// Runs the server until `shutdown_signal` resolves.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.config.socket_addr();
        let router = self.router();

        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind: {}", e)))?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");

        Ok(())
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.socket_addr()
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Health and token lifecycle. The lifecycle handlers validate the bearer
/// token themselves.
fn public_routes(guard: &AccessGuard) -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/auth/tokens",
            post(handlers::issue_token).delete(handlers::revoke_token),
        )
        .route("/auth/tokens/validate", get(handlers::validate_token))
        .route("/auth/tokens/refresh", post(handlers::refresh_token))
        .route("/auth/tokens/user", get(handlers::token_user))
        .route_layer(guard.public())
}

fn internal_routes(guard: &AccessGuard) -> Router<AppState> {
    let read = get(handlers::get_user)
        .route_layer(guard.internal(vec![Requirement::app("users", "read")]));
    let write = put(handlers::update_user)
        .route_layer(guard.internal(vec![Requirement::app("users", "write")]));

    Router::new().route("/user/{id}", read.merge(write))
}

fn private_routes(guard: &AccessGuard) -> Router<AppState> {
    Router::new()
        .route("/admin/policies", get(handlers::list_policies))
        .route_layer(guard.private(vec![
            Requirement::app("policies", "read"),
            Requirement::resource("policy-tables", "inspect"),
        ]))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Creates the CORS layer from configuration.
fn create_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = &config.cors;

    let mut layer = CorsLayer::new().max_age(Duration::from_secs(cors.max_age));

    if cors.allowed_origins.iter().any(|o| o == "*") {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        layer = layer.allow_origin(origins);
    }

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    layer = layer.allow_methods(methods);

    if cors.allowed_headers.iter().any(|h| h == "*") {
        layer = layer.allow_headers(Any);
    } else {
        layer = layer.allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);
    }

    layer
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{JwtConfig, Principal};
    use crate::directory::{InMemoryDirectory, PrincipalSeed};
    use crate::policy::{PolicyEngine, PolicyTable};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "test-secret-key-that-is-long-enough";

    async fn test_server() -> ApiServer {
        let config = ApiConfig::default().with_jwt(JwtConfig::new(SECRET));
        let app = PolicyTable::new()
            .allow("member", "users", "read")
            .allow("admin", "users", "write")
            .allow("admin", "policies", "read")
            .link("admin", "member");
        let resource = PolicyTable::new().allow("admin", "policy-tables", "inspect");
        let directory = InMemoryDirectory::from_seeds([PrincipalSeed {
            id: 7,
            uuid: Some(Uuid::new_v4()),
            email: "m@example.com".to_string(),
            name: "Member".to_string(),
            role: "member".to_string(),
            password_hash: "unused".to_string(),
        }])
        .unwrap();

        let state = AppState::builder()
            .config(config)
            .policy(PolicyEngine::from_tables(app, resource).await.unwrap())
            .directory(Arc::new(directory))
            .build()
            .unwrap();
        ApiServer::new(state)
    }

    fn bearer(server: &ApiServer, role: &str) -> String {
        let principal = Principal::new(7, Uuid::new_v4(), "m@example.com", "Member", role);
        let issued = server.state().tokens().issue(&principal).unwrap();
        format!("Bearer {}", issued.token)
    }

    async fn send(server: &ApiServer, method: Method, uri: &str, auth: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let body = if uri.starts_with("/user") {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(r#"{"name":"Renamed"}"#)
        } else {
            Body::empty()
        };

        server
            .router()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let server = test_server().await;
        assert_eq!(send(&server, Method::GET, "/health", None).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_internal_requires_token() {
        let server = test_server().await;
        assert_eq!(
            send(&server, Method::GET, "/user/7", None).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_per_method_requirements() {
        let server = test_server().await;
        let member = bearer(&server, "member");

        assert_eq!(
            send(&server, Method::GET, "/user/7", Some(&member)).await,
            StatusCode::OK
        );
        assert_eq!(
            send(&server, Method::PUT, "/user/7", Some(&member)).await,
            StatusCode::FORBIDDEN
        );

        let admin = bearer(&server, "admin");
        assert_eq!(
            send(&server, Method::PUT, "/user/7", Some(&admin)).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_private_requires_both_domains() {
        let server = test_server().await;

        let member = bearer(&server, "member");
        assert_eq!(
            send(&server, Method::GET, "/admin/policies", Some(&member)).await,
            StatusCode::FORBIDDEN
        );

        let admin = bearer(&server, "admin");
        assert_eq!(
            send(&server, Method::GET, "/admin/policies", Some(&admin)).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let server = test_server().await;
        assert_eq!(
            send(&server, Method::GET, "/nope", None).await,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_cors_layer_with_explicit_origins() {
        let mut config = ApiConfig::default();
        config.cors.allowed_origins = vec!["https://admin.example.com".to_string(), "\n".to_string()];
        let _layer = create_cors_layer(&config);
    }
}
