// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Configuration Integration Tests
//!
//! File-based loading through `warden-bin`, from disk to a ready policy
//! engine and principal directory.
//!
//! ## Test Categories
//!
//! - `test_load_*`: Format handling and path resolution
//! - `test_env_*`: Environment overrides
//! - `test_validate_*`: The `validate` command
//! - `test_runtime_*`: Component construction from loaded configuration

use std::fs;
use std::path::Path;
use std::time::Duration;

use warden_api::config::RevocationBackend;
use clap::Parser;
use warden_api::{InMemoryDirectory, PolicyScope, PrincipalDirectory};
use warden_bin::cli::{Cli, Commands};
use warden_bin::commands::execute;
use warden_bin::config::ConfigFormat;
use warden_bin::runtime::{build_revocation_store, load_policy};
use warden_bin::ConfigLoader;
use warden_tests::common::*;

/// Writes the fixture YAML and both CSV tables into `dir`.
fn write_fixture_files(dir: &Path) -> std::path::PathBuf {
    fs::write(dir.join("app.csv"), PolicyFixtures::APP_CSV).unwrap();
    fs::write(dir.join("resource.csv"), PolicyFixtures::RESOURCE_CSV).unwrap();

    let path = dir.join("warden.yaml");
    fs::write(&path, ConfigFixtures::yaml()).unwrap();
    path
}

fn loader(prefix: &str) -> ConfigLoader {
    ConfigLoader::new().with_env_prefix(prefix)
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_load_yaml_resolves_policy_paths() {
    let dir = temp_test_dir("warden-config");
    let path = write_fixture_files(dir.path());

    let config = loader("WARDEN_IT_YAML").load(&path).unwrap();

    assert_eq!(config.port, 8181);
    assert_eq!(config.jwt.issuer, "warden-test");
    assert_eq!(config.revocation.timeout, Duration::from_millis(150));
    assert_eq!(config.revocation.sweep_interval, Duration::from_secs(5));
    assert_eq!(config.policy.app.as_deref(), Some(dir.path().join("app.csv").as_path()));
    assert_eq!(
        config.policy.resource.as_deref(),
        Some(dir.path().join("resource.csv").as_path())
    );
    assert_eq!(config.principals.len(), 1);
}

#[test]
fn test_load_toml_and_json_agree() {
    let dir = temp_test_dir("warden-config");

    let toml_path = dir.path().join("warden.toml");
    fs::write(
        &toml_path,
        format!(
            r#"
port = 9001

[jwt]
secret = "{TEST_SECRET}"
issuer = "warden-toml"

[revocation]
timeout = 75
"#
        ),
    )
    .unwrap();

    let json_path = dir.path().join("warden.json");
    fs::write(
        &json_path,
        format!(
            r#"{{
  "port": 9001,
  "jwt": {{ "secret": "{TEST_SECRET}", "issuer": "warden-toml" }},
  "revocation": {{ "timeout": 75 }}
}}"#
        ),
    )
    .unwrap();

    let from_toml = loader("WARDEN_IT_TOML").load(&toml_path).unwrap();
    let from_json = loader("WARDEN_IT_JSON").load(&json_path).unwrap();

    assert_eq!(from_toml.port, from_json.port);
    assert_eq!(from_toml.jwt.issuer, from_json.jwt.issuer);
    assert_eq!(from_toml.revocation.timeout, Duration::from_millis(75));
    assert_eq!(from_json.revocation.timeout, Duration::from_millis(75));
    assert_eq!(from_toml.revocation.backend, RevocationBackend::Memory);
}

#[test]
fn test_load_rejects_short_secret() {
    let err = loader("WARDEN_IT_SHORT")
        .load_from_str("jwt:\n  secret: short\n", ConfigFormat::Yaml)
        .unwrap_err();

    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("jwt"));
}

#[test]
fn test_load_missing_file() {
    let dir = temp_test_dir("warden-config");
    let err = loader("WARDEN_IT_MISSING")
        .load(dir.path().join("nope.yaml"))
        .unwrap_err();

    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_load_unknown_extension() {
    let dir = temp_test_dir("warden-config");
    let path = dir.path().join("warden.ini");
    fs::write(&path, "port=1").unwrap();

    assert!(loader("WARDEN_IT_INI").load(&path).is_err());
}

// =============================================================================
// Environment
// =============================================================================

#[test]
fn test_env_overrides_file_values() {
    let dir = temp_test_dir("warden-config");
    let path = write_fixture_files(dir.path());

    std::env::set_var("WARDEN_IT_ENV_PORT", "9393");
    std::env::set_var("WARDEN_IT_ENV_JWT_ISSUER", "warden-env");
    std::env::set_var("WARDEN_IT_ENV_REDIS_URL", "redis://cache:6379");

    let config = loader("WARDEN_IT_ENV").load(&path).unwrap();

    assert_eq!(config.port, 9393);
    assert_eq!(config.jwt.issuer, "warden-env");
    assert_eq!(config.revocation.backend, RevocationBackend::Redis);
    assert_eq!(
        config.revocation.redis_url.as_deref(),
        Some("redis://cache:6379")
    );
}

#[test]
fn test_env_placeholders() {
    std::env::set_var("WARDEN_IT_PLACEHOLDER_SECRET", TEST_SECRET);

    let content = "\
port: ${WARDEN_IT_PLACEHOLDER_PORT:7777}
jwt:
  secret: ${WARDEN_IT_PLACEHOLDER_SECRET}
";
    let config = loader("WARDEN_IT_PLACEHOLDER")
        .load_from_str(content, ConfigFormat::Yaml)
        .unwrap();

    assert_eq!(config.port, 7777);
    assert_eq!(config.jwt.secret, TEST_SECRET);
}

// =============================================================================
// validate command
// =============================================================================

#[tokio::test]
async fn test_validate_command_accepts_fixture() {
    let dir = temp_test_dir("warden-config");
    let path = write_fixture_files(dir.path());

    let cli = Cli::parse_from([
        "warden",
        "-c",
        path.to_str().unwrap(),
        "validate",
        "-f",
        "json",
    ]);

    assert!(matches!(cli.command, Some(Commands::Validate(_))));
    execute(cli).await.unwrap();
}

#[tokio::test]
async fn test_validate_strict_fails_on_warnings() {
    let dir = temp_test_dir("warden-config");
    let path = write_fixture_files(dir.path());

    // The memory backend always warns.
    let cli = Cli::parse_from([
        "warden",
        "-c",
        path.to_str().unwrap(),
        "validate",
        "--strict",
    ]);

    let err = execute(cli).await.unwrap_err();
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_validate_reports_bad_policy() {
    let dir = temp_test_dir("warden-config");
    let path = write_fixture_files(dir.path());
    fs::write(dir.path().join("app.csv"), "p, member\n").unwrap();

    let cli = Cli::parse_from(["warden", "-c", path.to_str().unwrap(), "validate"]);

    let err = execute(cli).await.unwrap_err();
    assert!(err.to_string().contains("app.csv"), "got: {err}");
}

// =============================================================================
// Runtime components
// =============================================================================

#[tokio::test]
async fn test_runtime_components_from_fixture() {
    let dir = temp_test_dir("warden-config");
    let path = write_fixture_files(dir.path());
    let config = loader("WARDEN_IT_RUNTIME").load(&path).unwrap();

    let policy = load_policy(&config.policy).await.unwrap();
    assert!(policy
        .evaluate(PolicyScope::App, "admin", "users", "read")
        .unwrap());
    assert!(policy
        .evaluate(PolicyScope::Resource, "admin", "policy-tables", "inspect")
        .unwrap());

    let directory = InMemoryDirectory::from_seeds(config.principals.clone()).unwrap();
    let admin = directory
        .find_by_email(PrincipalFixtures::ADMIN_EMAIL)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.principal.role, "admin");

    let revocation = build_revocation_store(&config.revocation).await.unwrap();
    assert_eq!(revocation.store.backend(), "memory");
    revocation.shutdown().await;
}
