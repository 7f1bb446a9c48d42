// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Principals, policy tables and configuration shared across suites.

use std::sync::OnceLock;

use uuid::Uuid;
use warden_api::directory::hash_password;
use warden_api::{ApiConfig, JwtConfig, PolicyTable, Principal, PrincipalSeed};

/// Signing secret used by every fixture configuration.
pub const TEST_SECRET: &str = "integration-test-secret-that-is-long-enough";

// =============================================================================
// Principal Fixtures
// =============================================================================

/// Principals seeded into the test directory.
///
/// | id | email               | role     |
/// |----|---------------------|----------|
/// | 1  | admin@example.com   | admin    |
/// | 2  | member@example.com  | member   |
/// | 3  | auditor@example.com | auditor  |
pub struct PrincipalFixtures;

impl PrincipalFixtures {
    /// Password shared by every fixture principal.
    pub const PASSWORD: &'static str = "correct horse battery staple";
    /// Admin login.
    pub const ADMIN_EMAIL: &'static str = "admin@example.com";
    /// Member login.
    pub const MEMBER_EMAIL: &'static str = "member@example.com";
    /// Auditor login.
    pub const AUDITOR_EMAIL: &'static str = "auditor@example.com";

    /// Argon2 hash of [`Self::PASSWORD`], computed once per test binary.
    pub fn password_hash() -> String {
        static HASH: OnceLock<String> = OnceLock::new();
        HASH.get_or_init(|| hash_password(Self::PASSWORD).expect("hashing should succeed"))
            .clone()
    }

    fn seed(id: i64, email: &str, name: &str, role: &str) -> PrincipalSeed {
        PrincipalSeed {
            id,
            uuid: Some(Uuid::from_u128(id as u128)),
            email: email.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            password_hash: Self::password_hash(),
        }
    }

    /// All seeded principals.
    pub fn seeds() -> Vec<PrincipalSeed> {
        vec![
            Self::seed(1, Self::ADMIN_EMAIL, "Ada Admin", "admin"),
            Self::seed(2, Self::MEMBER_EMAIL, "Mo Member", "member"),
            Self::seed(3, Self::AUDITOR_EMAIL, "Aud Itor", "auditor"),
        ]
    }

    /// A principal that is not in the directory, for minting tokens directly.
    pub fn with_role(role: &str) -> Principal {
        Principal::new(99, Uuid::new_v4(), "ghost@example.com", "Ghost", role)
    }
}

// =============================================================================
// Policy Fixtures
// =============================================================================

/// Policy tables for both domains.
pub struct PolicyFixtures;

impl PolicyFixtures {
    /// App scope: members read users; admins inherit member and may write
    /// users and read policies; auditors read policies only.
    pub fn app() -> PolicyTable {
        PolicyTable::new()
            .allow("member", "users", "read")
            .allow("admin", "users", "write")
            .allow("admin", "policies", "read")
            .allow("auditor", "policies", "read")
            .link("admin", "member")
    }

    /// Resource scope: only admins may inspect policy tables.
    pub fn resource() -> PolicyTable {
        PolicyTable::new().allow("admin", "policy-tables", "*")
    }

    /// The app table in CSV form.
    pub const APP_CSV: &'static str = "\
# app scope
p, member, users, read
p, admin, users, write
p, admin, policies, read
p, auditor, policies, read

g, admin, member
";

    /// The resource table in CSV form.
    pub const RESOURCE_CSV: &'static str = "p, admin, policy-tables, *\n";
}

// =============================================================================
// Config Fixtures
// =============================================================================

/// Configuration fixtures.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// A valid configuration with the fixture principals.
    pub fn api_config() -> ApiConfig {
        let mut config = ApiConfig::default().with_jwt(JwtConfig::new(TEST_SECRET));
        config.principals = PrincipalFixtures::seeds();
        config
    }

    /// A YAML configuration document referencing policy files by relative path.
    pub fn yaml() -> String {
        format!(
            r#"
host: 127.0.0.1
port: 8181
jwt:
  secret: "{TEST_SECRET}"
  issuer: warden-test
  expiration_secs: 900
revocation:
  backend: memory
  timeout: 150
  sweep_interval: 5
policy:
  app: app.csv
  resource: resource.csv
principals:
  - id: 1
    email: {email}
    name: Ada Admin
    role: admin
    password_hash: "{hash}"
"#,
            email = PrincipalFixtures::ADMIN_EMAIL,
            hash = PrincipalFixtures::password_hash(),
        )
    }
}
