use serde::{Deserialize, Serialize};

use crate::status::DependencyStatus;

/// A named prerequisite a node waits on before its next provisioning step.
///
/// A node may carry several entries with the same name. Their order is the
/// order they were added in and lookups scan front to back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dependency {
    pub name: String,
    pub status: DependencyStatus,
    pub retries: u32,
}

impl Dependency {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: DependencyStatus::New,
            retries: 0,
        }
    }

    pub fn with_status(mut self, status: DependencyStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    pub fn is_ready(&self) -> bool {
        self.status == DependencyStatus::Ready
    }
}
