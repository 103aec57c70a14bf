//! Error types for the project bookkeeping core.

use std::path::PathBuf;

/// Errors surfaced by the aggregate, the reservation pool and the stores.
///
/// Pool exhaustion and missing entities are expected outcomes that callers
/// recover from. Storage failures are passed through untouched; the core never
/// retries I/O on its own.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// No project in the collection is free to reserve.
    #[error("could not find any available projects to reserve")]
    PoolExhausted,

    #[error("node not found: {id}")]
    NodeNotFound { id: String },

    #[error("ssh key not found: {id}")]
    KeyNotFound { id: String },

    #[error("project not found: {id}")]
    ProjectNotFound { id: String },

    /// Project options were rejected before a project was built.
    #[error("invalid project options: {0}")]
    InvalidOptions(String),

    /// A loaded or staged document violates an aggregate invariant.
    #[error("invalid project document: {0}")]
    InvalidDocument(String),

    /// A reservation grace period that is not positive or pushes the
    /// deadline out of the representable range.
    #[error("invalid reservation grace time: {0}")]
    InvalidGraceTime(chrono::Duration),

    #[error("timed out waiting for store lock: {}", path.display())]
    LockTimeout { path: PathBuf },

    #[error("key generation failed: {0:#}")]
    KeyGeneration(anyhow::Error),

    /// The load/persist collaborator failed.
    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

impl CoreError {
    /// True for outcomes a caller is expected to handle and move on from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::PoolExhausted
                | CoreError::NodeNotFound { .. }
                | CoreError::KeyNotFound { .. }
                | CoreError::ProjectNotFound { .. }
                | CoreError::LockTimeout { .. }
        )
    }
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
