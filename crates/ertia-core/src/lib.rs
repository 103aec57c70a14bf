//! Ertia Core Library
//!
//! Bookkeeping for cluster provisioning: projects and their nodes, SSH keys,
//! DNS records and deployments, a reservation pool over pre-staged projects,
//! and the per-node dependency/status state machine.

pub mod config;
pub mod context;
pub mod deployment;
pub mod dns;
pub mod error;
pub mod keys;
pub mod node;
pub mod pool;
pub mod project;
pub mod status;
pub mod store;

mod wire;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ErtiaPaths, Settings};
    pub use crate::context::AppContext;

    // Errors
    pub use crate::error::{CoreError, Result};

    // Entities
    pub use crate::deployment::{Deployment, Provisioning};
    pub use crate::dns::Dns;
    pub use crate::keys::{Ed25519KeyGenerator, KeyGenerator, SshKey};
    pub use crate::node::{Dependency, Node, NodeFeatures, RetryOutcome};
    pub use crate::project::{Project, ProjectOptions, Projects};

    // Status vocabulary
    pub use crate::status::{
        DependencyStatus, DeploymentStatus, DnsStatus, KeyStatus, NodeStatus, ProvisioningStatus,
    };

    // Pool and storage
    pub use crate::pool::ReservationPool;
    pub use crate::store::{JsonProjectStore, MemoryProjectStore, ProjectRepository};
}
