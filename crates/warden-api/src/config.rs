// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::JwtConfig;
use crate::directory::PrincipalSeed;

// =============================================================================
// ApiConfig
// =============================================================================

/// Configuration for the API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host address.
    pub host: IpAddr,
    /// Server port.
    pub port: u16,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Revocation store configuration.
    pub revocation: RevocationConfig,
    /// Policy source configuration.
    pub policy: PolicyConfig,
    /// Principals served by the in-memory directory.
    pub principals: Vec<PrincipalSeed>,
    /// Request timeout.
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    /// Graceful shutdown timeout.
    #[serde(with = "duration_secs")]
    pub shutdown_timeout: Duration,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
            cors: CorsConfig::default(),
            jwt: JwtConfig::default(),
            revocation: RevocationConfig::default(),
            policy: PolicyConfig::default(),
            principals: Vec::new(),
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(30),
            max_body_size: 64 * 1024, // 64KB
        }
    }
}

impl ApiConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Sets the host address.
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the JWT configuration.
    pub fn with_jwt(mut self, jwt: JwtConfig) -> Self {
        self.jwt = jwt;
        self
    }

    /// Sets the revocation configuration.
    pub fn with_revocation(mut self, revocation: RevocationConfig) -> Self {
        self.revocation = revocation;
        self
    }

    /// Checks cross-field constraints, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if let Err(e) = self.jwt.validate() {
            problems.push(format!("jwt: {e}"));
        }
        if self.revocation.backend == RevocationBackend::Redis && self.revocation.redis_url.is_none() {
            problems.push("revocation: redis backend requires redis_url".to_string());
        }
        if self.revocation.timeout.is_zero() {
            problems.push("revocation: timeout must be positive".to_string());
        }
        if self.request_timeout.is_zero() {
            problems.push("request_timeout must be positive".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

// =============================================================================
// CorsConfig
// =============================================================================

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins.
    pub allowed_origins: Vec<String>,
    /// Allowed methods.
    pub allowed_methods: Vec<String>,
    /// Allowed headers.
    pub allowed_headers: Vec<String>,
    /// Max age for preflight cache (seconds).
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
                "OPTIONS".to_string(),
            ],
            allowed_headers: vec![
                "Content-Type".to_string(),
                "Authorization".to_string(),
            ],
            max_age: 3600,
        }
    }
}

impl CorsConfig {
    /// Creates a restrictive CORS configuration for production.
    pub fn strict(origins: Vec<String>) -> Self {
        Self {
            allowed_origins: origins,
            ..Default::default()
        }
    }
}

// =============================================================================
// RevocationConfig
// =============================================================================

/// Revocation store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevocationBackend {
    /// Process-local store.
    Memory,
    /// Shared Redis store.
    Redis,
}

/// Revocation store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevocationConfig {
    /// Which backend to use.
    pub backend: RevocationBackend,
    /// Redis connection URL.
    pub redis_url: Option<String>,
    /// Redis key prefix.
    pub key_prefix: String,
    /// Bound on each revocation lookup.
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
    /// How often the memory store drops expired entries.
    #[serde(with = "duration_secs")]
    pub sweep_interval: Duration,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            backend: RevocationBackend::Memory,
            redis_url: None,
            key_prefix: crate::auth::revocation::DEFAULT_KEY_PREFIX.to_string(),
            timeout: Duration::from_millis(250),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

// =============================================================================
// PolicyConfig
// =============================================================================

/// Locations of the two policy tables.
///
/// A missing path yields an empty table, which denies everything in that
/// domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// CSV file for the app-scope table.
    pub app: Option<PathBuf>,
    /// CSV file for the resource-scope table.
    pub resource: Option<PathBuf>,
}

// =============================================================================
// Duration serde helpers
// =============================================================================

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.revocation.backend, RevocationBackend::Memory);
        assert_eq!(config.revocation.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig::default().with_port(9000);
        let addr = config.socket_addr();
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn test_validate_reports_all_problems() {
        let mut config = ApiConfig::default();
        config.revocation.backend = RevocationBackend::Redis;

        let problems = config.validate().unwrap_err();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].starts_with("jwt"));
    }

    #[test]
    fn test_validate_ok() {
        let config = ApiConfig::default()
            .with_jwt(JwtConfig::new("a-secret-that-is-long-enough-for-hs256"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ApiConfig = serde_json::from_value(serde_json::json!({
            "port": 9090,
            "revocation": { "backend": "redis", "redis_url": "redis://localhost", "timeout": 100 },
            "policy": { "app": "/etc/warden/app.csv" }
        }))
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.revocation.backend, RevocationBackend::Redis);
        assert_eq!(config.revocation.timeout, Duration::from_millis(100));
        assert_eq!(config.revocation.sweep_interval, Duration::from_secs(60));
        assert!(config.policy.resource.is_none());
    }
}
