// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Policy Integration Tests
//!
//! Loading policy tables from CSV files and the evaluation properties both
//! domains rely on.
//!
//! ## Test Categories
//!
//! - `test_csv_*`: File-backed sources
//! - `prop_*`: Property-based evaluation checks

use std::collections::HashSet;
use std::fs;

use proptest::prelude::*;

use warden_api::policy::{CsvPolicySource, StaticPolicySource};
use warden_api::{PolicyEngine, PolicyScope, PolicyTable};
use warden_bin::runtime::load_policy;
use warden_tests::common::*;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime should build")
        .block_on(future)
}

fn fixture_engine() -> PolicyEngine {
    block_on(PolicyEngine::from_tables(
        PolicyFixtures::app(),
        PolicyFixtures::resource(),
    ))
    .expect("fixture tables should load")
}

// =============================================================================
// CSV sources
// =============================================================================

#[tokio::test]
async fn test_csv_matches_static_tables() {
    let dir = temp_test_dir("warden-policy");
    let app_path = dir.path().join("app.csv");
    let resource_path = dir.path().join("resource.csv");
    fs::write(&app_path, PolicyFixtures::APP_CSV).unwrap();
    fs::write(&resource_path, PolicyFixtures::RESOURCE_CSV).unwrap();

    let from_csv = PolicyEngine::from_sources(
        &CsvPolicySource::new(&app_path),
        &CsvPolicySource::new(&resource_path),
    )
    .await
    .unwrap();
    let from_static = PolicyEngine::from_sources(
        &StaticPolicySource::new(PolicyFixtures::app()),
        &StaticPolicySource::new(PolicyFixtures::resource()),
    )
    .await
    .unwrap();

    let queries = [
        (PolicyScope::App, "member", "users", "read"),
        (PolicyScope::App, "member", "users", "write"),
        (PolicyScope::App, "admin", "users", "read"),
        (PolicyScope::App, "admin", "users", "write"),
        (PolicyScope::App, "auditor", "policies", "read"),
        (PolicyScope::App, "auditor", "users", "read"),
        (PolicyScope::Resource, "admin", "policy-tables", "inspect"),
        (PolicyScope::Resource, "auditor", "policy-tables", "inspect"),
    ];
    for (scope, role, resource, action) in queries {
        assert_eq!(
            from_csv.evaluate(scope, role, resource, action).unwrap(),
            from_static.evaluate(scope, role, resource, action).unwrap(),
            "{scope} {role} {resource} {action}"
        );
    }
}

#[tokio::test]
async fn test_csv_missing_file_is_an_error() {
    let dir = temp_test_dir("warden-policy");
    let config = warden_api::config::PolicyConfig {
        app: Some(dir.path().join("absent.csv")),
        resource: None,
    };

    let err = load_policy(&config).await.unwrap_err();
    assert!(err.to_string().contains("absent.csv"));
}

#[tokio::test]
async fn test_csv_reports_offending_line() {
    let dir = temp_test_dir("warden-policy");
    let path = dir.path().join("app.csv");
    fs::write(&path, "p, member, users, read\np, admin, users\n").unwrap();

    let err = PolicyEngine::from_sources(
        &CsvPolicySource::new(&path),
        &StaticPolicySource::default(),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("line 2"), "got: {err}");
}

#[tokio::test]
async fn test_csv_glob_resources() {
    let dir = temp_test_dir("warden-policy");
    let path = dir.path().join("resource.csv");
    fs::write(&path, "p, owner, projects/*, *\np, viewer, projects/*, read\n").unwrap();

    let engine = PolicyEngine::from_sources(
        &StaticPolicySource::default(),
        &CsvPolicySource::new(&path),
    )
    .await
    .unwrap();

    assert!(engine
        .evaluate(PolicyScope::Resource, "owner", "projects/42", "delete")
        .unwrap());
    assert!(engine
        .evaluate(PolicyScope::Resource, "viewer", "projects/42", "read")
        .unwrap());
    assert!(!engine
        .evaluate(PolicyScope::Resource, "viewer", "projects/42", "write")
        .unwrap());
    assert!(!engine
        .evaluate(PolicyScope::App, "owner", "projects/42", "read")
        .unwrap());
}

#[tokio::test]
async fn test_deny_all_engine() {
    let engine = PolicyEngine::deny_all().await.unwrap();

    for scope in [PolicyScope::App, PolicyScope::Resource] {
        assert!(!engine.evaluate(scope, "admin", "users", "read").unwrap());
    }
}

// =============================================================================
// Properties
// =============================================================================

const FIXTURE_ROLES: &[&str] = &["admin", "member", "auditor"];
const FIXTURE_RESOURCES: &[&str] = &["users", "policies", "policy-tables", "other"];
const FIXTURE_ACTIONS: &[&str] = &["read", "write", "inspect"];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_roles_without_rules_are_denied(
        role in "[a-z]{3,12}",
        resource in "[a-z-]{1,16}",
        action in "[a-z]{1,8}",
    ) {
        prop_assume!(!FIXTURE_ROLES.contains(&role.as_str()));
        let engine = fixture_engine();

        for scope in [PolicyScope::App, PolicyScope::Resource] {
            prop_assert!(!engine.evaluate(scope, &role, &resource, &action).unwrap());
        }
    }

    #[test]
    fn prop_evaluation_is_deterministic(
        role in prop::sample::select(FIXTURE_ROLES),
        resource in prop::sample::select(FIXTURE_RESOURCES),
        action in prop::sample::select(FIXTURE_ACTIONS),
    ) {
        let engine = fixture_engine();

        for scope in [PolicyScope::App, PolicyScope::Resource] {
            let first = engine.evaluate(scope, role, resource, action).unwrap();
            for _ in 0..8 {
                prop_assert_eq!(engine.evaluate(scope, role, resource, action).unwrap(), first);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_flat_table_allows_exactly_its_rules(
        rules in prop::collection::vec(("[a-c]{1,2}", "[a-c]{1,2}", "[a-c]{1,2}"), 0..12),
        query in ("[a-c]{1,2}", "[a-c]{1,2}", "[a-c]{1,2}"),
    ) {
        let table = rules
            .iter()
            .fold(PolicyTable::new(), |table, (r, o, a)| table.allow(r.as_str(), o.as_str(), a.as_str()));
        let granted: HashSet<_> = rules.into_iter().collect();

        let engine = block_on(PolicyEngine::from_tables(table, PolicyTable::new())).unwrap();
        let (role, resource, action) = &query;

        prop_assert_eq!(
            engine.evaluate(PolicyScope::App, role, resource, action).unwrap(),
            granted.contains(&query)
        );
        prop_assert!(!engine.evaluate(PolicyScope::Resource, role, resource, action).unwrap());
    }
}
