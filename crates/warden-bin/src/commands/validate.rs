// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use warden_api::config::RevocationBackend;
use warden_api::{ApiConfig, InMemoryDirectory, PolicyEngine, PolicyScope};

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::config::load_config;
use crate::error::{BinError, BinResult};
use crate::runtime::load_policy;

/// Executes the `validate` command.
///
/// Loads the configuration, both policy tables and the principal seeds, then
/// reports a summary. Nothing is bound and no store is contacted.
pub async fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    let config = load_config(config_path)
        .map_err(|e| e.with_context("Configuration validation failed"))?;
    let policy = load_policy(&config.policy).await?;
    let directory = InMemoryDirectory::from_seeds(config.principals.clone())?;

    let warnings = collect_warnings(&config, &policy);

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!("  Listen:      {}", config.socket_addr());
            println!("  Issuer:      {}", config.jwt.issuer);
            println!("  Lifetime:    {}s", config.jwt.expiration_secs);
            println!("  Revocation:  {:?}", config.revocation.backend);
            println!("  Principals:  {}", directory.len());
            for scope in [PolicyScope::App, PolicyScope::Resource] {
                let (rules, links) = table_size(&policy, scope);
                println!("  Policy {:<9} {} rules, {} links", format!("{scope}:"), rules, links);
            }

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!("{}", serde_json::to_string_pretty(&config).map_err(|e| BinError::runtime(e.to_string()))?);
            }
        }
        OutputFormat::Json => {
            let (app_rules, app_links) = table_size(&policy, PolicyScope::App);
            let (res_rules, res_links) = table_size(&policy, PolicyScope::Resource);
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "summary": {
                    "listen": config.socket_addr().to_string(),
                    "issuer": config.jwt.issuer,
                    "expiration_secs": config.jwt.expiration_secs,
                    "revocation_backend": config.revocation.backend,
                    "principals": directory.len(),
                    "policy": {
                        "app": { "rules": app_rules, "links": app_links },
                        "resource": { "rules": res_rules, "links": res_links },
                    },
                },
                "warnings": warnings,
                "config": if args.show_config { Some(&config) } else { None },
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&output).map_err(|e| BinError::runtime(e.to_string()))?
            );
        }
    }

    if args.strict && !warnings.is_empty() {
        return Err(BinError::config(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}

fn table_size(policy: &PolicyEngine, scope: PolicyScope) -> (usize, usize) {
    policy
        .evaluator(scope)
        .table()
        .map(|t| (t.rules.len(), t.links.len()))
        .unwrap_or((0, 0))
}

fn collect_warnings(config: &ApiConfig, policy: &PolicyEngine) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.principals.is_empty() {
        warnings.push("No principals configured; every login will fail".to_string());
    }
    if config.jwt.secret.len() < 32 {
        warnings.push("JWT secret is shorter than 32 bytes".to_string());
    }
    if config.revocation.backend == RevocationBackend::Memory {
        warnings.push("In-memory revocation store is not shared between instances".to_string());
    }
    for scope in [PolicyScope::App, PolicyScope::Resource] {
        if table_size(policy, scope).0 == 0 {
            warnings.push(format!("{scope} policy table is empty; every {scope} check denies"));
        }
    }
    for principal in &config.principals {
        let known = [PolicyScope::App, PolicyScope::Resource].iter().any(|scope| {
            policy
                .evaluator(*scope)
                .table()
                .is_some_and(|t| t.roles().contains(&principal.role.as_str()))
        });
        if !known {
            warnings.push(format!(
                "Principal {} has role `{}` which no policy mentions",
                principal.id, principal.role
            ));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_api::{JwtConfig, PolicyTable, PrincipalSeed};

    fn seed(role: &str) -> PrincipalSeed {
        PrincipalSeed {
            id: 1,
            uuid: None,
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            role: role.to_string(),
            password_hash: "x".to_string(),
        }
    }

    #[tokio::test]
    async fn test_warnings() {
        let mut config = ApiConfig::default().with_jwt(JwtConfig::new("short"));
        config.principals = vec![seed("ghost")];
        let policy = PolicyEngine::from_tables(
            PolicyTable::new().allow("member", "users", "read"),
            PolicyTable::new(),
        )
        .await
        .unwrap();

        let warnings = collect_warnings(&config, &policy);
        assert!(warnings.iter().any(|w| w.contains("shorter than 32")));
        assert!(warnings.iter().any(|w| w.contains("resource policy table is empty")));
        assert!(warnings.iter().any(|w| w.contains("`ghost`")));
        assert!(!warnings.iter().any(|w| w.contains("app policy table is empty")));
    }

    #[tokio::test]
    async fn test_known_role_is_not_flagged() {
        let mut config = ApiConfig::default();
        config.principals = vec![seed("member")];
        let policy = PolicyEngine::from_tables(
            PolicyTable::new().allow("member", "users", "read"),
            PolicyTable::new(),
        )
        .await
        .unwrap();

        let warnings = collect_warnings(&config, &policy);
        assert!(!warnings.iter().any(|w| w.contains("no policy mentions")));
    }
}
