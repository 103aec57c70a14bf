//! SSH key metadata and the key generation collaborator.

pub mod ed25519;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

use crate::status::KeyStatus;

pub use ed25519::Ed25519KeyGenerator;

const KEY_ID_LEN: usize = 10;

/// A generated key pair attached to a project.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SshKey {
    pub id: String,
    pub name: String,
    /// Id assigned once the provider has the public key.
    pub provider_id: String,
    pub status: KeyStatus,
    pub fingerprint: String,
    pub error: String,
    /// PEM-encoded private key.
    pub private_key: String,
    /// Public key in authorized_keys format.
    pub public_key: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl SshKey {
    /// Wrap freshly generated key material. The key starts out `NEW`.
    pub fn new(
        private_key: String,
        public_key: String,
        fingerprint: String,
    ) -> Self {
        let id = short_id();
        let now = Utc::now();
        Self {
            name: id.clone(),
            id,
            provider_id: String::new(),
            status: KeyStatus::New,
            fingerprint,
            error: String::new(),
            private_key,
            public_key,
            created: now,
            updated: now,
        }
    }

    pub fn needs_adapting(&self) -> bool {
        self.status == KeyStatus::New
    }
}

/// Produces key pairs for new projects.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self) -> anyhow::Result<SshKey>;
}

fn short_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_ID_LEN)
        .map(char::from)
        .collect()
}
