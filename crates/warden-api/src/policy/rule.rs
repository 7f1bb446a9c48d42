// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Policy rules and role links.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

// =============================================================================
// PolicyRule
// =============================================================================

/// Grants `action` on `resource` to `role`.
///
/// `resource` may use `keyMatch` globs (`users/*`); `action` may be `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Role the rule applies to.
    pub role: String,
    /// Resource name or glob.
    pub resource: String,
    /// Action name or `*`.
    pub action: String,
}

impl PolicyRule {
    /// Creates a new rule.
    pub fn new(
        role: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            resource: resource.into(),
            action: action.into(),
        }
    }

    pub(crate) fn to_params(&self) -> Vec<String> {
        vec![self.role.clone(), self.resource.clone(), self.action.clone()]
    }
}

// =============================================================================
// RoleLink
// =============================================================================

/// Makes `member` inherit every rule granted to `parent`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleLink {
    /// The inheriting role.
    pub member: String,
    /// The role whose rules are inherited.
    pub parent: String,
}

impl RoleLink {
    /// Creates a new role link.
    pub fn new(member: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            parent: parent.into(),
        }
    }

    pub(crate) fn to_params(&self) -> Vec<String> {
        vec![self.member.clone(), self.parent.clone()]
    }
}

// =============================================================================
// PolicyTable
// =============================================================================

/// A complete rule table for one policy domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTable {
    /// Allow rules.
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
    /// Role inheritance links.
    #[serde(default)]
    pub links: Vec<RoleLink>,
}

impl PolicyTable {
    /// Creates an empty table, which denies everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an allow rule.
    pub fn allow(
        mut self,
        role: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        self.rules.push(PolicyRule::new(role, resource, action));
        self
    }

    /// Adds a role link.
    pub fn link(mut self, member: impl Into<String>, parent: impl Into<String>) -> Self {
        self.links.push(RoleLink::new(member, parent));
        self
    }

    /// Appends another table.
    pub fn merge(mut self, other: PolicyTable) -> Self {
        self.rules.extend(other.rules);
        self.links.extend(other.links);
        self
    }

    /// Drops duplicate rules and links, keeping first occurrences in order.
    pub fn dedup(mut self) -> Self {
        let mut seen = HashSet::new();
        self.rules.retain(|r| seen.insert(r.clone()));

        let mut seen = HashSet::new();
        self.links.retain(|l| seen.insert(l.clone()));
        self
    }

    /// Returns `true` if the table grants nothing.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the distinct roles mentioned by rules or links.
    pub fn roles(&self) -> Vec<&str> {
        let mut roles: Vec<&str> = self
            .rules
            .iter()
            .map(|r| r.role.as_str())
            .chain(self.links.iter().flat_map(|l| [l.member.as_str(), l.parent.as_str()]))
            .collect();
        roles.sort_unstable();
        roles.dedup();
        roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_order() {
        let table = PolicyTable::new()
            .allow("admin", "users", "read")
            .allow("member", "users", "read")
            .allow("admin", "users", "read")
            .link("admin", "member")
            .link("admin", "member")
            .dedup();

        assert_eq!(table.rules.len(), 2);
        assert_eq!(table.rules[0].role, "admin");
        assert_eq!(table.links.len(), 1);
    }

    #[test]
    fn test_roles() {
        let table = PolicyTable::new()
            .allow("member", "users", "read")
            .link("admin", "member");

        assert_eq!(table.roles(), vec!["admin", "member"]);
    }
}
