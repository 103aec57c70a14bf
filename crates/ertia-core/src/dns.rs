//! DNS record owned by a project.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::DnsStatus;
use crate::wire;

/// Suffix for generated sub-domains.
pub const DEFAULT_DOMAIN: &str = "ertia.cloud";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dns {
    pub domain: String,
    #[serde(with = "wire::optional_ip")]
    pub ipv4: Option<IpAddr>,
    pub status: DnsStatus,
    pub error: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Dns {
    pub fn new(domain: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            domain: domain.into(),
            ipv4: None,
            status: DnsStatus::New,
            error: String::new(),
            created: now,
            updated: now,
        }
    }

    /// A record needs adapting until a DNS step has picked it up.
    pub fn needs_adapting(&self) -> bool {
        self.status == DnsStatus::New
    }

    pub fn mark_ready(&mut self, ipv4: IpAddr) {
        self.ipv4 = Some(ipv4);
        self.status = DnsStatus::Ready;
        self.error.clear();
        self.updated = Utc::now();
    }

    pub fn mark_error(&mut self, error: impl Into<String>) {
        self.status = DnsStatus::Error;
        self.error = error.into();
        self.updated = Utc::now();
    }
}
