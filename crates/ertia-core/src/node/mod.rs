//! Nodes and the per-node dependency/status state machine.
//!
//! Everything here is a pure in-memory transition. Persisting the result is
//! the caller's job, which keeps the state machine testable without I/O.

pub mod dependency;
pub mod naming;

use std::collections::BTreeMap;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deployment::Deployment;
use crate::status::NodeStatus;
use crate::wire;

pub use dependency::Dependency;
pub use naming::{node_name, sub_domain, sub_domain_of};

/// A node whose counter is above this value is marked failing on the next retry.
pub const MAX_NODE_RETRIES: u32 = 10;

/// Named boolean feature switches on a node.
pub type NodeFeatures = BTreeMap<String, bool>;

/// A single machine inside a project, either the cluster master or a worker.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub cluster_name: String,
    pub provider_id: String,
    /// Join token workers use to register with the master.
    pub node_token: String,
    pub is_master: bool,
    /// Set on workers only.
    #[serde(rename = "masterIP", with = "wire::optional_ip")]
    pub master_ip: Option<IpAddr>,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub tags: Vec<String>,
    pub name: String,
    #[serde(with = "wire::optional_ip")]
    pub ipv4: Option<IpAddr>,
    #[serde(with = "wire::optional_ip")]
    pub ipv6: Option<IpAddr>,
    pub status: NodeStatus,
    pub retries: u32,
    /// Last provisioning error, empty when none.
    pub error: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub deleted: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub features: NodeFeatures,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub dependencies: Vec<Dependency>,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub deployments: Vec<Deployment>,
    pub install_password: String,
    pub install_user: String,
}

/// Result of escalating a node's retry counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Counter incremented; the node is `RETRYING`.
    Retrying { attempt: u32 },
    /// Cap exceeded; the node is `FAILING` and the counter is left alone.
    Exhausted { retries: u32 },
}

impl RetryOutcome {
    pub fn is_exhausted(self) -> bool {
        matches!(self, RetryOutcome::Exhausted { .. })
    }
}

impl Node {
    /// A fresh `NEW` node with a generated id and name.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: node_name(),
            status: NodeStatus::New,
            created: now,
            updated: now,
            ..Self::default()
        }
    }

    /// Whether the node should be scheduled for a provisioning action.
    pub fn needs_adapting(&self) -> bool {
        matches!(
            self.status,
            NodeStatus::New | NodeStatus::Active | NodeStatus::Retrying
        )
    }

    /// True if any entry named `dependency` is still outstanding.
    pub fn requires(&self, dependency: &str) -> bool {
        self.dependencies
            .iter()
            .any(|d| d.name == dependency && d.is_pending())
    }

    /// True if any entry named `dependency` is ready.
    ///
    /// With duplicate entries a node can both require and fulfil the same
    /// name.
    pub fn fulfils(&self, dependency: &str) -> bool {
        self.dependencies
            .iter()
            .any(|d| d.name == dependency && d.is_ready())
    }

    /// First entry with the given name.
    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.name == name)
    }

    pub fn dependency_mut(&mut self, name: &str) -> Option<&mut Dependency> {
        self.dependencies.iter_mut().find(|d| d.name == name)
    }

    /// Append a `NEW` dependency after the existing ones.
    pub fn add_dependency(&mut self, name: impl Into<String>) -> &mut Dependency {
        self.dependencies.push(Dependency::new(name));
        let last = self.dependencies.len() - 1;
        &mut self.dependencies[last]
    }

    /// Escalate the retry counter using the default cap.
    pub fn retry(&mut self) -> RetryOutcome {
        self.retry_with_limit(MAX_NODE_RETRIES)
    }

    pub fn retry_with_limit(&mut self, limit: u32) -> RetryOutcome {
        if self.retries > limit {
            self.status = NodeStatus::Failing;
            return RetryOutcome::Exhausted {
                retries: self.retries,
            };
        }

        self.retries += 1;
        self.status = NodeStatus::Retrying;
        RetryOutcome::Retrying {
            attempt: self.retries,
        }
    }

    /// Record a failed provisioning step and escalate.
    pub fn record_failure(&mut self, error: impl Into<String>, limit: u32) -> RetryOutcome {
        self.error = error.into();
        let outcome = self.retry_with_limit(limit);
        if outcome.is_exhausted() {
            tracing::warn!(node = %self.id, retries = self.retries, "node retry limit exceeded");
        }
        outcome
    }

    pub fn feature(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }

    pub fn set_feature(&mut self, name: impl Into<String>, enabled: bool) {
        self.features.insert(name.into(), enabled);
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some() || self.status == NodeStatus::Deleted
    }

    /// Soft-delete: the node stays in the document with a deletion stamp.
    pub fn mark_deleted(&mut self) {
        let now = Utc::now();
        self.status = NodeStatus::Deleted;
        self.deleted = Some(now);
        self.updated = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::DependencyStatus;

    #[test]
    fn test_new_node_defaults() {
        let node = Node::new();
        assert_eq!(node.status, NodeStatus::New);
        assert_eq!(node.retries, 0);
        assert!(!node.is_master);
        assert!(node.master_ip.is_none());
        assert!(!node.id.is_empty());
        assert!(!node.name.is_empty());
        assert!(node.needs_adapting());
    }

    #[test]
    fn test_add_dependency_preserves_order() {
        let mut node = Node::new();
        node.add_dependency("k3s");
        node.add_dependency("helm").status = DependencyStatus::Waiting;
        node.add_dependency("k3s").status = DependencyStatus::Ready;

        let names: Vec<&str> = node.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["k3s", "helm", "k3s"]);
        assert_eq!(node.dependency("k3s").unwrap().status, DependencyStatus::New);
    }

    #[test]
    fn test_features() {
        let mut node = Node::new();
        assert!(!node.feature("gpu"));
        node.set_feature("gpu", true);
        assert!(node.feature("gpu"));
    }

    #[test]
    fn test_mark_deleted() {
        let mut node = Node::new();
        node.mark_deleted();
        assert!(node.is_deleted());
        assert!(!node.needs_adapting());
    }
}
