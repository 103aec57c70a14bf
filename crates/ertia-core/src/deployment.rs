//! Deployments and provisionings tracked on projects and nodes.

use serde::{Deserialize, Serialize};

use crate::status::{DeploymentStatus, ProvisioningStatus};

/// A workload pushed onto a project or node from a source repository.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Deployment {
    pub name: String,
    pub owner: String,
    pub repo: String,
    pub tag: String,
    pub token: String,
    pub status: DeploymentStatus,
    pub retries: u32,
}

impl Deployment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Point the deployment at `owner/repo` pinned to `tag`.
    pub fn with_source(
        mut self,
        owner: impl Into<String>,
        repo: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        self.owner = owner.into();
        self.repo = repo.into();
        self.tag = tag.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn is_ready(&self) -> bool {
        self.status == DeploymentStatus::Ready
    }
}

/// An organisation-level provisioning step run against a project.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Provisioning {
    pub name: String,
    pub status: ProvisioningStatus,
    pub retries: u32,
    pub organization: String,
}

impl Provisioning {
    pub fn new(name: impl Into<String>, organization: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            organization: organization.into(),
            ..Self::default()
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == ProvisioningStatus::Ready
    }
}
