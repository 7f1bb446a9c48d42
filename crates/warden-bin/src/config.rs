// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading.
//!
//! # Loading Pipeline
//!
//! 1. Read the file and pick a format from its extension
//! 2. Substitute `${VAR}` / `${VAR:default}` placeholders
//! 3. Deserialize into [`ApiConfig`]
//! 4. Apply `WARDEN_*` environment overrides
//! 5. Resolve relative policy paths against the config file's directory
//! 6. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! WARDEN_HOST=127.0.0.1
//! WARDEN_PORT=9090
//! WARDEN_JWT_SECRET=...
//! WARDEN_JWT_ISSUER=warden-staging
//! WARDEN_REDIS_URL=redis://cache:6379
//! WARDEN_POLICY_APP=/etc/warden/app.csv
//! WARDEN_POLICY_RESOURCE=/etc/warden/resource.csv
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use warden_api::config::RevocationBackend;
use warden_api::ApiConfig;

use crate::error::{BinError, BinResult};

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> BinResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(BinError::config(format!("unsupported config format: {other}"))),
            None => Err(BinError::config("unsupported config format: (no extension)")),
        }
    }

    fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T, String> {
        match self {
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

// =============================================================================
// ConfigLoader
// =============================================================================

/// Loads [`ApiConfig`] from a file plus environment overrides.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_prefix: String,
    resolve_env_vars: bool,
}

impl ConfigLoader {
    /// Creates a loader using the `WARDEN` prefix.
    pub fn new() -> Self {
        Self {
            env_prefix: "WARDEN".to_string(),
            resolve_env_vars: true,
        }
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables placeholder substitution and overrides.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Loads and validates the configuration at `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> BinResult<ApiConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(BinError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path)
            .map_err(|e| BinError::io(format!("{}: {}", path.display(), e)))?;

        let format = ConfigFormat::from_path(path)?;
        let mut config = self.load_from_str(&content, format).map_err(|e| {
            e.with_context(format!("Failed to load {}", path.display()))
        })?;

        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        resolve_relative_paths(&mut config, &base);

        debug!(
            principals = config.principals.len(),
            backend = ?config.revocation.backend,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Parses, overrides and validates configuration content.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> BinResult<ApiConfig> {
        let content = if self.resolve_env_vars {
            resolve_env_placeholders(content)
        } else {
            content.to_string()
        };

        let mut config: ApiConfig = format.parse(&content).map_err(BinError::config)?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }

        config
            .validate()
            .map_err(|problems| BinError::config(problems.join("; ")))?;

        Ok(config)
    }

    fn var(&self, name: &str) -> Option<(String, String)> {
        let key = format!("{}_{}", self.env_prefix, name);
        env::var(&key).ok().map(|value| (key, value))
    }

    fn apply_env_overrides(&self, config: &mut ApiConfig) -> BinResult<()> {
        if let Some((key, value)) = self.var("HOST") {
            config.host = value
                .parse()
                .map_err(|_| BinError::config(format!("{key}: expected an IP address")))?;
        }
        if let Some((key, value)) = self.var("PORT") {
            config.port = value
                .parse()
                .map_err(|_| BinError::config(format!("{key}: expected valid port number")))?;
        }
        if let Some((_, value)) = self.var("JWT_SECRET") {
            config.jwt.secret = value;
        }
        if let Some((_, value)) = self.var("JWT_ISSUER") {
            config.jwt.issuer = value;
        }
        if let Some((_, value)) = self.var("REDIS_URL") {
            config.revocation.redis_url = Some(value);
            config.revocation.backend = RevocationBackend::Redis;
        }
        if let Some((_, value)) = self.var("POLICY_APP") {
            config.policy.app = Some(PathBuf::from(value));
        }
        if let Some((_, value)) = self.var("POLICY_RESOURCE") {
            config.policy.resource = Some(PathBuf::from(value));
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Substitutes `${VAR}` and `${VAR:default}` placeholders.
///
/// Unset variables without a default are left as written.
fn resolve_env_placeholders(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            return result;
        };

        let inner = &after[..end];
        let (name, default) = match inner.split_once(':') {
            Some((name, default)) => (name, Some(default)),
            None => (inner, None),
        };

        match (env::var(name), default) {
            (Ok(value), _) => result.push_str(&value),
            (Err(_), Some(default)) => result.push_str(default),
            (Err(_), None) => {
                warn!("Environment variable '{}' not found", name);
                result.push_str(&rest[start..start + 2 + end + 1]);
            }
        }

        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

fn resolve_relative_paths(config: &mut ApiConfig, base: &Path) {
    for path in [&mut config.policy.app, &mut config.policy.resource]
        .into_iter()
        .flatten()
    {
        if path.is_relative() {
            *path = base.join(&*path);
        }
    }
}

/// Loads configuration from a file with default settings.
pub fn load_config(path: impl AsRef<Path>) -> BinResult<ApiConfig> {
    ConfigLoader::new().load(path)
}

// =============================================================================
// Tests
// =============================================================================
