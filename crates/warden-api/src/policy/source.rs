// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Policy sources.
//!
//! Sources are read once at startup. The CSV format follows Casbin's policy
//! file layout:
//!
//! ```text
//! # comment
//! p, member, users, read
//! p, admin, users/*, *
//! g, admin, member
//! ```

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use super::{PolicyError, PolicyRule, PolicyTable, RoleLink};

/// A startup-time supplier of policy rules and role links.
pub trait PolicySource: Send + Sync + Debug {
    /// Loads the full table.
    fn load(&self) -> Result<PolicyTable, PolicyError>;
}

// =============================================================================
// StaticPolicySource
// =============================================================================

/// A source backed by an in-memory table.
#[derive(Debug, Clone, Default)]
pub struct StaticPolicySource {
    table: PolicyTable,
}

impl StaticPolicySource {
    /// Creates a source returning the given table.
    pub fn new(table: PolicyTable) -> Self {
        Self { table }
    }
}

impl PolicySource for StaticPolicySource {
    fn load(&self) -> Result<PolicyTable, PolicyError> {
        Ok(self.table.clone())
    }
}

// =============================================================================
// CsvPolicySource
// =============================================================================

/// A source reading a Casbin-style CSV policy file.
#[derive(Debug, Clone)]
pub struct CsvPolicySource {
    path: PathBuf,
}

impl CsvPolicySource {
    /// Creates a source for the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PolicySource for CsvPolicySource {
    fn load(&self) -> Result<PolicyTable, PolicyError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| PolicyError::Io {
            path: self.path.clone(),
            source,
        })?;

        parse_csv(&self.path.display().to_string(), &content)
    }
}

/// Parses Casbin-style CSV policy text.
pub fn parse_csv(origin: &str, content: &str) -> Result<PolicyTable, PolicyError> {
    let mut table = PolicyTable::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.iter().any(|f| f.is_empty()) {
            return Err(PolicyError::parse(origin, index + 1, "empty field"));
        }

        match fields.as_slice() {
            ["p", role, resource, action] => {
                table.rules.push(PolicyRule::new(*role, *resource, *action));
            }
            ["g", member, parent] => {
                table.links.push(RoleLink::new(*member, *parent));
            }
            ["p", ..] => {
                return Err(PolicyError::parse(
                    origin,
                    index + 1,
                    "expected `p, role, resource, action`",
                ));
            }
            ["g", ..] => {
                return Err(PolicyError::parse(origin, index + 1, "expected `g, role, parent`"));
            }
            _ => {
                return Err(PolicyError::parse(
                    origin,
                    index + 1,
                    format!("unknown rule type `{}`", fields[0]),
                ));
            }
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_rules_and_links() {
        let table = parse_csv(
            "inline",
            "# app policy\n\np, member, users, read\np,admin , users/* , *\ng, admin, member\n",
        )
        .unwrap();

        assert_eq!(
            table.rules,
            vec![
                PolicyRule::new("member", "users", "read"),
                PolicyRule::new("admin", "users/*", "*"),
            ]
        );
        assert_eq!(table.links, vec![RoleLink::new("admin", "member")]);
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        let err = parse_csv("inline", "p, member, users\n").unwrap_err();
        assert!(matches!(err, PolicyError::Parse { line: 1, .. }));

        let err = parse_csv("inline", "p, member, users, read\nx, a, b\n").unwrap_err();
        assert!(matches!(err, PolicyError::Parse { line: 2, .. }));

        let err = parse_csv("inline", "g, admin,\n").unwrap_err();
        assert!(matches!(err, PolicyError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_csv_source_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "p, member, users, read").unwrap();

        let table = CsvPolicySource::new(file.path()).load().unwrap();
        assert_eq!(table.rules.len(), 1);
    }

    #[test]
    fn test_csv_source_missing_file() {
        let source = CsvPolicySource::new("/nonexistent/policy.csv");
        assert!(matches!(source.load(), Err(PolicyError::Io { .. })));
    }
}
