// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Casbin-backed policy evaluator.

use std::fmt;

use casbin::{CoreApi, DefaultModel, Enforcer, MemoryAdapter, MgmtApi};
use tracing::debug;

use super::{PolicyError, PolicyEvaluator, PolicyTable};

/// RBAC model shared by both policy domains.
///
/// Roles inherit through `g`, resources match with `keyMatch` globs and a
/// `*` action grants every action on the matched resource.
pub const MODEL_CONF: &str = r#"
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[role_definition]
g = _, _

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = g(r.sub, p.sub) && keyMatch(r.obj, p.obj) && (r.act == p.act || p.act == "*")
"#;

/// A policy evaluator over one immutable rule table.
pub struct CasbinEvaluator {
    name: String,
    enforcer: Enforcer,
    table: PolicyTable,
}

impl CasbinEvaluator {
    /// Builds an evaluator from a rule table.
    ///
    /// The table is deduplicated before loading; the enforcer is never
    /// mutated afterwards.
    pub async fn build(name: impl Into<String>, table: PolicyTable) -> Result<Self, PolicyError> {
        let name = name.into();
        let table = table.dedup();

        let model = DefaultModel::from_str(MODEL_CONF)
            .await
            .map_err(|e| PolicyError::Build(e.to_string()))?;
        let adapter = MemoryAdapter::default();
        let mut enforcer = Enforcer::new(model, adapter)
            .await
            .map_err(|e| PolicyError::Build(e.to_string()))?;

        if !table.rules.is_empty() {
            let rules = table.rules.iter().map(|r| r.to_params()).collect();
            enforcer
                .add_policies(rules)
                .await
                .map_err(|e| PolicyError::Build(e.to_string()))?;
        }

        if !table.links.is_empty() {
            let links = table.links.iter().map(|l| l.to_params()).collect();
            enforcer
                .add_grouping_policies(links)
                .await
                .map_err(|e| PolicyError::Build(e.to_string()))?;
        }

        enforcer
            .build_role_links()
            .map_err(|e| PolicyError::Build(e.to_string()))?;

        debug!(
            domain = %name,
            rules = table.rules.len(),
            links = table.links.len(),
            "Policy evaluator built"
        );

        Ok(Self {
            name,
            enforcer,
            table,
        })
    }
}

impl PolicyEvaluator for CasbinEvaluator {
    fn evaluate(&self, role: &str, resource: &str, action: &str) -> Result<bool, PolicyError> {
        self.enforcer
            .enforce((role, resource, action))
            .map_err(|e| PolicyError::Eval(e.to_string()))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn table(&self) -> Option<&PolicyTable> {
        Some(&self.table)
    }
}

impl fmt::Debug for CasbinEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CasbinEvaluator")
            .field("name", &self.name)
            .field("rules", &self.table.rules.len())
            .field("links", &self.table.links.len())
            .finish()
    }
}
