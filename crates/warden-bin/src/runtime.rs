// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Server runtime orchestration.
//!
//! - Revocation store selection (memory with sweeper, or Redis)
//! - Policy table loading for both domains
//! - Principal directory seeding
//! - API server with graceful shutdown

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use warden_api::config::{PolicyConfig, RevocationBackend, RevocationConfig};
use warden_api::policy::{CsvPolicySource, PolicySource, StaticPolicySource};
use warden_api::{
    ApiConfig, ApiServer, AppState, ClaimsCodec, InMemoryDirectory, MemoryRevocationStore,
    PolicyEngine, RedisRevocationStore, RevocationStore, TokenService,
};

use crate::config::load_config;
use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// Component construction
// =============================================================================

/// A revocation store plus the sweeper task backing it, if any.
pub struct RevocationComponents {
    /// The store handed to the token service.
    pub store: Arc<dyn RevocationStore>,
    memory: Option<(Arc<MemoryRevocationStore>, JoinHandle<()>)>,
}

impl RevocationComponents {
    /// Stops the sweeper, if one is running, and waits for it.
    pub async fn shutdown(self) {
        if let Some((store, handle)) = self.memory {
            store.stop_sweeper();
            if let Err(e) = handle.await {
                warn!(error = %e, "Revocation sweeper ended abnormally");
            }
        }
    }
}

/// Builds the configured revocation store.
pub async fn build_revocation_store(config: &RevocationConfig) -> BinResult<RevocationComponents> {
    match config.backend {
        RevocationBackend::Memory => {
            let store = Arc::new(MemoryRevocationStore::new());
            let sweeper = store.spawn_sweeper(config.sweep_interval);
            info!(sweep_interval = ?config.sweep_interval, "Using in-memory revocation store");

            Ok(RevocationComponents {
                store: store.clone(),
                memory: Some((store, sweeper)),
            })
        }
        RevocationBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| BinError::config("redis backend requires redis_url"))?;
            let store = RedisRevocationStore::connect(url)
                .await
                .map_err(|e| BinError::from(e).with_context("Failed to connect to Redis"))?
                .with_prefix(config.key_prefix.clone());
            info!(prefix = %config.key_prefix, "Using Redis revocation store");

            Ok(RevocationComponents {
                store: Arc::new(store),
                memory: None,
            })
        }
    }
}

fn policy_source(path: Option<&Path>) -> Box<dyn PolicySource> {
    match path {
        Some(path) => Box::new(CsvPolicySource::new(path)),
        None => Box::new(StaticPolicySource::default()),
    }
}

/// Loads both policy domains. A domain without a file denies everything.
pub async fn load_policy(config: &PolicyConfig) -> BinResult<PolicyEngine> {
    if config.app.is_none() {
        warn!("No app-scope policy configured; every app-scope check will deny");
    }
    if config.resource.is_none() {
        warn!("No resource-scope policy configured; every resource-scope check will deny");
    }

    let app = policy_source(config.app.as_deref());
    let resource = policy_source(config.resource.as_deref());

    Ok(PolicyEngine::from_sources(app.as_ref(), resource.as_ref()).await?)
}

// =============================================================================
// WardenRuntime
// =============================================================================

/// Owns the configuration and runs the server until shutdown.
pub struct WardenRuntime {
    config: ApiConfig,
    shutdown: ShutdownCoordinator,
}

impl WardenRuntime {
    /// Creates a runtime for the given configuration.
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown_coordinator(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Builds every component and serves until SIGINT/SIGTERM.
    pub async fn run(self) -> BinResult<()> {
        info!("Starting warden v{}", warden_api::VERSION);

        let revocation = build_revocation_store(&self.config.revocation).await?;
        let policy = load_policy(&self.config.policy).await?;
        let directory = InMemoryDirectory::from_seeds(self.config.principals.clone())?;
        info!(principals = directory.len(), "Principal directory seeded");

        let codec = ClaimsCodec::new(self.config.jwt.clone())?;
        let tokens = TokenService::new(codec, revocation.store.clone())
            .with_store_timeout(self.config.revocation.timeout);

        let shutdown_timeout = self.config.shutdown_timeout;
        let state = AppState::builder()
            .config(self.config)
            .tokens(tokens)
            .policy(policy)
            .directory(Arc::new(directory))
            .build()?;
        let server = ApiServer::new(state);

        let signals = {
            let coordinator = self.shutdown.clone();
            tokio::spawn(async move { coordinator.listen_for_signals().await })
        };

        let mut server_task = tokio::spawn(server.run_with_shutdown(self.shutdown.shutdown_signal()));

        let result = tokio::select! {
            joined = &mut server_task => flatten(joined),
            _ = self.shutdown.shutdown_signal() => {
                info!("Draining in-flight requests");
                match tokio::time::timeout(shutdown_timeout, &mut server_task).await {
                    Ok(joined) => flatten(joined),
                    Err(_) => {
                        warn!(timeout = ?shutdown_timeout, "Graceful shutdown timed out");
                        server_task.abort();
                        Ok(())
                    }
                }
            }
        };

        self.shutdown.initiate_shutdown();
        match signals.await {
            Ok(Err(e)) => warn!(error = %e, "Signal listener failed"),
            Err(e) => warn!(error = %e, "Signal listener panicked"),
            Ok(Ok(())) => {}
        }
        revocation.shutdown().await;

        info!("warden shutdown complete");
        result
    }
}

fn flatten(
    joined: Result<warden_api::ApiResult<()>, tokio::task::JoinError>,
) -> BinResult<()> {
    match joined {
        Ok(result) => Ok(result?),
        Err(e) => Err(BinError::runtime(format!("server task failed: {e}"))),
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the runtime.
#[derive(Default)]
pub struct RuntimeBuilder {
    config_path: Option<std::path::PathBuf>,
    config: Option<ApiConfig>,
    port: Option<u16>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the listen port.
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> BinResult<WardenRuntime> {
        let mut config = match self.config {
            Some(config) => config,
            None => {
                let path = self
                    .config_path
                    .ok_or_else(|| BinError::config("No configuration provided"))?;
                load_config(&path)?
            }
        };

        if let Some(port) = self.port {
            config.port = port;
        }

        Ok(WardenRuntime::new(config))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use warden_api::{JwtConfig, PolicyScope};

    fn test_config() -> ApiConfig {
        ApiConfig::default().with_jwt(JwtConfig::new("test-secret-key-that-is-long-enough"))
    }

    #[test]
    fn test_runtime_builder_port_override() {
        let runtime = RuntimeBuilder::new()
            .config(test_config())
            .port(Some(9191))
            .build()
            .unwrap();

        assert_eq!(runtime.config.port, 9191);
    }

    #[test]
    fn test_runtime_builder_requires_config() {
        assert!(RuntimeBuilder::new().build().is_err());
    }

    #[tokio::test]
    async fn test_memory_store_with_sweeper() {
        let config = RevocationConfig {
            sweep_interval: Duration::from_millis(10),
            ..Default::default()
        };
        let components = build_revocation_store(&config).await.unwrap();
        assert_eq!(components.store.backend(), "memory");

        tokio::time::timeout(Duration::from_secs(1), components.shutdown())
            .await
            .expect("sweeper should stop");
    }

    #[tokio::test]
    async fn test_redis_requires_url() {
        let config = RevocationConfig {
            backend: RevocationBackend::Redis,
            ..Default::default()
        };
        assert!(build_revocation_store(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_load_policy_from_csv() {
        let mut app = tempfile::NamedTempFile::new().unwrap();
        writeln!(app, "p, member, users, read").unwrap();
        writeln!(app, "g, admin, member").unwrap();

        let config = PolicyConfig {
            app: Some(app.path().to_path_buf()),
            resource: None,
        };
        let engine = load_policy(&config).await.unwrap();

        assert!(engine.evaluate(PolicyScope::App, "admin", "users", "read").unwrap());
        assert!(!engine.evaluate(PolicyScope::Resource, "admin", "users", "read").unwrap());
    }

    #[tokio::test]
    async fn test_load_policy_rejects_bad_csv() {
        let mut app = tempfile::NamedTempFile::new().unwrap();
        writeln!(app, "x, member, users, read").unwrap();

        let config = PolicyConfig {
            app: Some(app.path().to_path_buf()),
            resource: None,
        };
        let err = load_policy(&config).await.unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
