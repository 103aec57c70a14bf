//! Lifecycle vocabularies shared by nodes, dependencies, deployments, keys and DNS.
//!
//! The wire identifiers are the upper-case strings below. Documents written by
//! earlier tooling use exactly these values, so renaming a variant is a
//! breaking change to the on-disk format. The enums carry no transition rules;
//! the owning entity decides which moves are legal.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Node lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    #[default]
    New,
    Deploying,
    Active,
    Ready,
    Failing,
    Retrying,
    Restarting,
    Stopped,
    Error,
    Deleted,
}

impl NodeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeStatus::New => "NEW",
            NodeStatus::Deploying => "DEPLOYING",
            NodeStatus::Active => "ACTIVE",
            NodeStatus::Ready => "READY",
            NodeStatus::Failing => "FAILING",
            NodeStatus::Retrying => "RETRYING",
            NodeStatus::Restarting => "RESTARTING",
            NodeStatus::Stopped => "STOPPED",
            NodeStatus::Error => "ERROR",
            NodeStatus::Deleted => "DELETED",
        }
    }
}

/// Dependency lifecycle. `Waiting` marks a prerequisite blocked on another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DependencyStatus {
    #[default]
    New,
    Deploying,
    Failing,
    Retrying,
    Ready,
    Waiting,
}

impl DependencyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DependencyStatus::New => "NEW",
            DependencyStatus::Deploying => "DEPLOYING",
            DependencyStatus::Failing => "FAILING",
            DependencyStatus::Retrying => "RETRYING",
            DependencyStatus::Ready => "READY",
            DependencyStatus::Waiting => "WAITING",
        }
    }

    /// Still outstanding: the node has to wait for it.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            DependencyStatus::New | DependencyStatus::Retrying | DependencyStatus::Waiting
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    #[default]
    New,
    Deploying,
    Failing,
    Retrying,
    Ready,
}

impl DeploymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentStatus::New => "NEW",
            DeploymentStatus::Deploying => "DEPLOYING",
            DeploymentStatus::Failing => "FAILING",
            DeploymentStatus::Retrying => "RETRYING",
            DeploymentStatus::Ready => "READY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvisioningStatus {
    #[default]
    New,
    Deploying,
    Failing,
    Retrying,
    Ready,
}

impl ProvisioningStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProvisioningStatus::New => "NEW",
            ProvisioningStatus::Deploying => "DEPLOYING",
            ProvisioningStatus::Failing => "FAILING",
            ProvisioningStatus::Retrying => "RETRYING",
            ProvisioningStatus::Ready => "READY",
        }
    }
}

/// SSH key lifecycle. A key stays `New` until a deployment step picks it up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyStatus {
    #[default]
    New,
    Adapting,
    Active,
    Failing,
    Deleted,
}

impl KeyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyStatus::New => "NEW",
            KeyStatus::Adapting => "ADAPTING",
            KeyStatus::Active => "ACTIVE",
            KeyStatus::Failing => "FAILING",
            KeyStatus::Deleted => "DELETED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DnsStatus {
    #[default]
    New,
    Ready,
    Error,
}

impl DnsStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DnsStatus::New => "NEW",
            DnsStatus::Ready => "READY",
            DnsStatus::Error => "ERROR",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

display_as_str!(
    NodeStatus,
    DependencyStatus,
    DeploymentStatus,
    ProvisioningStatus,
    KeyStatus,
    DnsStatus,
);
