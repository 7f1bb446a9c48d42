// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role-based policy evaluation.
//!
//! Two independent policy domains share one [`PolicyEvaluator`] contract:
//!
//! - **App scope**: coarse capability gating (`users`/`read`)
//! - **Resource scope**: fine-grained relationships on specific resources
//!
//! Both are deny-by-default. A request that matches no rule is denied; it is
//! never an error. Tables are loaded once at startup and never mutated, so
//! evaluation needs no locking.

mod enforcer;
mod error;
mod rule;
mod source;

use std::fmt::{self, Debug};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

pub use enforcer::{CasbinEvaluator, MODEL_CONF};
pub use error::PolicyError;
pub use rule::{PolicyRule, PolicyTable, RoleLink};
pub use source::{parse_csv, CsvPolicySource, PolicySource, StaticPolicySource};

// =============================================================================
// PolicyEvaluator
// =============================================================================

/// Evaluates whether a role may perform an action on a resource.
pub trait PolicyEvaluator: Send + Sync + Debug {
    /// Returns `Ok(true)` only if a rule allows the request.
    fn evaluate(&self, role: &str, resource: &str, action: &str) -> Result<bool, PolicyError>;

    /// Returns the domain name for logging.
    fn name(&self) -> &str;

    /// Returns the loaded table, if the evaluator exposes it.
    fn table(&self) -> Option<&PolicyTable> {
        None
    }
}

// =============================================================================
// PolicyScope
// =============================================================================

/// Selects one of the two policy domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyScope {
    /// Application-wide capability gating.
    App,
    /// Per-resource permissions.
    Resource,
}

impl PolicyScope {
    /// Returns the scope name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyScope::App => "app",
            PolicyScope::Resource => "resource",
        }
    }
}

impl fmt::Display for PolicyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PolicyEngine
// =============================================================================

/// The pair of policy evaluators consulted by the access pipeline.
#[derive(Clone)]
pub struct PolicyEngine {
    app: Arc<dyn PolicyEvaluator>,
    resource: Arc<dyn PolicyEvaluator>,
}

impl PolicyEngine {
    /// Creates an engine from two evaluators.
    pub fn new(app: Arc<dyn PolicyEvaluator>, resource: Arc<dyn PolicyEvaluator>) -> Self {
        Self { app, resource }
    }

    /// Builds Casbin evaluators for both domains from their sources.
    pub async fn from_sources(
        app: &dyn PolicySource,
        resource: &dyn PolicySource,
    ) -> Result<Self, PolicyError> {
        Self::from_tables(app.load()?, resource.load()?).await
    }

    /// Builds Casbin evaluators for both domains from tables.
    pub async fn from_tables(app: PolicyTable, resource: PolicyTable) -> Result<Self, PolicyError> {
        let app = CasbinEvaluator::build(PolicyScope::App.as_str(), app).await?;
        let resource = CasbinEvaluator::build(PolicyScope::Resource.as_str(), resource).await?;

        Ok(Self::new(Arc::new(app), Arc::new(resource)))
    }

    /// Builds an engine that denies everything in both domains.
    pub async fn deny_all() -> Result<Self, PolicyError> {
        Self::from_tables(PolicyTable::new(), PolicyTable::new()).await
    }

    /// Returns the evaluator for a scope.
    pub fn evaluator(&self, scope: PolicyScope) -> &Arc<dyn PolicyEvaluator> {
        match scope {
            PolicyScope::App => &self.app,
            PolicyScope::Resource => &self.resource,
        }
    }

    /// Evaluates a request in the given scope.
    pub fn evaluate(
        &self,
        scope: PolicyScope,
        role: &str,
        resource: &str,
        action: &str,
    ) -> Result<bool, PolicyError> {
        let allowed = self.evaluator(scope).evaluate(role, resource, action)?;

        trace!(%scope, role, resource, action, allowed, "Policy evaluated");
        Ok(allowed)
    }
}

impl Debug for PolicyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("app", &self.app)
            .field("resource", &self.resource)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn engine() -> PolicyEngine {
        let app = PolicyTable::new()
            .allow("member", "users", "read")
            .allow("admin", "policies", "read")
            .link("admin", "member");
        let resource = PolicyTable::new().allow("admin", "policy-tables", "inspect");

        PolicyEngine::from_tables(app, resource).await.unwrap()
    }

    #[tokio::test]
    async fn test_domains_are_independent() {
        let engine = engine().await;

        assert!(engine.evaluate(PolicyScope::App, "admin", "policies", "read").unwrap());
        assert!(!engine
            .evaluate(PolicyScope::Resource, "admin", "policies", "read")
            .unwrap());
        assert!(engine
            .evaluate(PolicyScope::Resource, "admin", "policy-tables", "inspect")
            .unwrap());
        assert!(!engine
            .evaluate(PolicyScope::App, "admin", "policy-tables", "inspect")
            .unwrap());
    }

    #[tokio::test]
    async fn test_evaluation_is_deterministic() {
        let engine = engine().await;

        for _ in 0..10 {
            assert!(engine.evaluate(PolicyScope::App, "admin", "users", "read").unwrap());
            assert!(!engine.evaluate(PolicyScope::App, "member", "policies", "read").unwrap());
        }
    }

    #[tokio::test]
    async fn test_deny_all() {
        let engine = PolicyEngine::deny_all().await.unwrap();

        assert!(!engine.evaluate(PolicyScope::App, "admin", "users", "read").unwrap());
        assert!(!engine
            .evaluate(PolicyScope::Resource, "admin", "policy-tables", "inspect")
            .unwrap());
    }

    #[tokio::test]
    async fn test_from_sources() {
        let app = StaticPolicySource::new(PolicyTable::new().allow("member", "users", "read"));
        let resource = StaticPolicySource::default();

        let engine = PolicyEngine::from_sources(&app, &resource).await.unwrap();
        assert!(engine.evaluate(PolicyScope::App, "member", "users", "read").unwrap());
    }
}
