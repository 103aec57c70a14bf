//! Project aggregate: a provisioning unit and everything it owns.
//!
//! A project exclusively owns its nodes, SSH key, DNS record, deployments and
//! provisionings. All operations work on an aggregate already loaded into
//! memory and never touch storage.

pub mod collection;
pub mod options;

use std::collections::HashSet;
use std::io::Write;
use std::net::IpAddr;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::deployment::{Deployment, Provisioning};
use crate::dns::Dns;
use crate::error::{CoreError, Result};
use crate::keys::{KeyGenerator, SshKey};
use crate::node::Node;
use crate::wire;

pub use collection::Projects;
pub use options::ProjectOptions;

pub const DEFAULT_PROVIDER: &str = "GLESYS";

/// How long a reservation is held before the project may be reclaimed.
pub const RESERVE_GRACE_HOURS: i64 = 4;

pub fn default_grace_time() -> Duration {
    Duration::hours(RESERVE_GRACE_HOURS)
}

/// `now + grace`, rejecting grace periods that are not positive or that
/// overflow the timestamp range.
pub fn reservation_deadline(now: DateTime<Utc>, grace: Duration) -> Result<DateTime<Utc>> {
    if grace <= Duration::zero() {
        return Err(CoreError::InvalidGraceTime(grace));
    }
    now.checked_add_signed(grace)
        .ok_or(CoreError::InvalidGraceTime(grace))
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub provider: String,
    #[serde(rename = "providerID")]
    pub provider_id: String,
    pub provider_token: String,
    pub name: String,
    pub k3s_channel: String,
    pub dns: Option<Dns>,
    pub ssh_key: Option<SshKey>,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub nodes: Vec<Node>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub context: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub deployments: Vec<Deployment>,
    pub reserved: bool,
    /// Deletion deadline, set when the project is reserved.
    #[serde(rename = "delete")]
    pub delete_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub provisionings: Vec<Provisioning>,
}

impl Project {
    /// Build a project from options and attach a freshly generated key pair.
    pub fn new(options: ProjectOptions, keys: &dyn KeyGenerator) -> Result<Self> {
        let mut project = Self::from_options(options)?;
        let key = keys.generate().map_err(CoreError::KeyGeneration)?;
        project.ssh_key = Some(key);
        tracing::info!(project = %project.id, provider = %project.provider, "created project");
        Ok(project)
    }

    /// Build a project from options without a key pair.
    pub fn from_options(options: ProjectOptions) -> Result<Self> {
        options.validate()?;

        let now = Utc::now();
        Ok(Self {
            id: options
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            provider: options
                .provider
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            provider_id: options.provider_id.unwrap_or_default(),
            provider_token: options.provider_token.unwrap_or_default(),
            name: options.name.unwrap_or_default(),
            k3s_channel: options.k3s_channel.unwrap_or_default(),
            dns: options.domain.map(Dns::new),
            created: now,
            updated: now,
            deployments: options.deployments,
            provisionings: options.provisionings,
            ..Self::default()
        })
    }

    /// Parse a single-project document. Absent fields and `null` collections
    /// read as their zero values.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse project document")
    }

    /// Pretty-printed document with the stored field names.
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize project")
    }

    /// Like [`to_json`](Self::to_json), streamed to `writer` with a trailing
    /// newline.
    pub fn write_json<W: Write>(&self, mut writer: W) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut writer, self).context("Failed to serialize project")?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------------

    /// Add a node, making it the master if the project has none yet.
    ///
    /// Workers inherit the master's IPv4 and join token as they are at this
    /// moment. Node names are random and may repeat.
    pub fn add_node(&mut self) -> &Node {
        let mut node = Node::new();

        if let Some(master) = self.find_master_node() {
            node.master_ip = master.ipv4;
            node.node_token = master.node_token.clone();
        } else {
            node.is_master = true;
        }

        tracing::debug!(
            project = %self.id,
            node = %node.id,
            is_master = node.is_master,
            "added node"
        );
        self.nodes.push(node);
        &self.nodes[self.nodes.len() - 1]
    }

    /// First node whose IPv4 address is `ip`.
    pub fn find_node_by_ipv4(&self, ip: IpAddr) -> Option<&Node> {
        self.nodes.iter().find(|n| n.ipv4 == Some(ip))
    }

    /// Node with the given id, if any.
    pub fn find_node_by_id(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn find_node_by_id_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// First node with the given name. Names are not unique.
    pub fn find_node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// The master node, if one has been added.
    pub fn find_master_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.is_master)
    }

    /// First worker node.
    pub fn find_non_master_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| !n.is_master)
    }

    /// Replace the stored node with the same id, stamping `updated`.
    pub fn update_node(&mut self, mut node: Node) -> Result<&Node> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == node.id)
            .ok_or_else(|| CoreError::NodeNotFound {
                id: node.id.clone(),
            })?;

        node.updated = Utc::now();
        self.nodes[index] = node;
        Ok(&self.nodes[index])
    }

    /// Remove a node by id. The remaining nodes keep their order.
    pub fn remove_node(&mut self, id: &str) -> Result<Node> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| CoreError::NodeNotFound { id: id.to_string() })?;

        let removed = self.nodes.remove(index);
        tracing::debug!(project = %self.id, node = %removed.id, "removed node");
        Ok(removed)
    }

    // ---------------------------------------------------------------------
    // Key and DNS
    // ---------------------------------------------------------------------

    /// Attach `key`, replacing any previous key, and stamp `updated`.
    pub fn update_key(&mut self, mut key: SshKey) -> &SshKey {
        key.updated = Utc::now();
        self.ssh_key.insert(key)
    }

    /// Detach the project's key. Fails if `id` is not the attached key.
    pub fn remove_key(&mut self, id: &str) -> Result<SshKey> {
        match self.ssh_key.take_if(|key| key.id == id) {
            Some(key) => Ok(key),
            None => Err(CoreError::KeyNotFound { id: id.to_string() }),
        }
    }

    /// Set the DNS record, replacing any previous one, and stamp `updated`.
    pub fn update_dns(&mut self, mut dns: Dns) -> &Dns {
        dns.updated = Utc::now();
        self.dns.insert(dns)
    }

    // ---------------------------------------------------------------------
    // Reservation
    // ---------------------------------------------------------------------

    /// Mark reserved with the default grace period.
    pub fn reserve(&mut self) -> Result<&mut Self> {
        self.reserve_at(Utc::now(), default_grace_time())
    }

    /// Mark reserved with a deadline of `now + grace`.
    ///
    /// # Errors
    /// [`CoreError::InvalidGraceTime`] if `grace` is not positive or the
    /// deadline is out of range. The project is left untouched.
    pub fn reserve_at(&mut self, now: DateTime<Utc>, grace: Duration) -> Result<&mut Self> {
        let deadline = reservation_deadline(now, grace)?;
        self.reserved = true;
        self.delete_at = Some(deadline);
        Ok(self)
    }

    /// Free to hand out: not reserved, no deadline pending and internally
    /// consistent.
    pub fn is_reservable(&self) -> bool {
        !self.reserved && self.delete_at.is_none() && self.validate().is_ok()
    }

    /// The deadline has passed and a reaper may reclaim the project.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.delete_at.is_some_and(|deadline| deadline <= now)
    }

    // ---------------------------------------------------------------------
    // Tags
    // ---------------------------------------------------------------------

    /// Add tags not already present, keeping first-insertion order.
    pub fn tag<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            let tag = tag.as_ref();
            if !self.has_tag(tag) {
                self.tags.push(tag.to_string());
            }
        }
        self
    }

    /// Exact, case-sensitive match.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    // ---------------------------------------------------------------------
    // Invariants
    // ---------------------------------------------------------------------

    /// Check the aggregate invariants of a loaded or staged document.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        let mut masters = 0usize;

        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(self.invalid(format!("duplicate node id '{}'", node.id)));
            }
            if node.is_master {
                masters += 1;
                if node.master_ip.is_some() {
                    return Err(
                        self.invalid(format!("master node '{}' carries a master ip", node.id))
                    );
                }
            }
        }

        if masters > 1 {
            return Err(self.invalid(format!("{masters} master nodes")));
        }
        if self.reserved && self.delete_at.is_none() {
            return Err(self.invalid("reserved without a deletion deadline".to_string()));
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> CoreError {
        CoreError::InvalidDocument(format!("project '{}': {}", self.id, reason))
    }
}
