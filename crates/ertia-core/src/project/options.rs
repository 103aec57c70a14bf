//! Construction options for new projects.

use crate::deployment::{Deployment, Provisioning};
use crate::error::{CoreError, Result};

/// Every recognised setting for a new project.
///
/// Unset fields fall back to the project defaults: a generated id, the
/// default provider, no DNS record and empty collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectOptions {
    pub id: Option<String>,
    pub provider: Option<String>,
    /// Project id on the provider side.
    pub provider_id: Option<String>,
    pub provider_token: Option<String>,
    pub name: Option<String>,
    /// Creates a `NEW` DNS record for this domain.
    pub domain: Option<String>,
    pub k3s_channel: Option<String>,
    pub deployments: Vec<Deployment>,
    pub provisionings: Vec<Provisioning>,
}

impl ProjectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    pub fn with_provider_token(mut self, token: impl Into<String>) -> Self {
        self.provider_token = Some(token.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_k3s_channel(mut self, channel: impl Into<String>) -> Self {
        self.k3s_channel = Some(channel.into());
        self
    }

    /// Deployments are kept in the given order, duplicates included.
    pub fn with_deployments(mut self, deployments: Vec<Deployment>) -> Self {
        self.deployments = deployments;
        self
    }

    pub fn with_provisionings(mut self, provisionings: Vec<Provisioning>) -> Self {
        self.provisionings = provisionings;
        self
    }

    /// Check the options before a project is built from them.
    ///
    /// # Errors
    /// [`CoreError::InvalidOptions`] for a blank id or provider, or a domain
    /// that is empty or contains whitespace.
    pub fn validate(&self) -> Result<()> {
        if let Some(id) = &self.id
            && id.trim().is_empty()
        {
            return Err(CoreError::InvalidOptions("id must not be blank".into()));
        }
        if let Some(provider) = &self.provider
            && provider.trim().is_empty()
        {
            return Err(CoreError::InvalidOptions(
                "provider must not be blank".into(),
            ));
        }
        if let Some(domain) = &self.domain {
            let domain = domain.trim_start_matches('.');
            if domain.is_empty() || domain.chars().any(char::is_whitespace) {
                return Err(CoreError::InvalidOptions(format!(
                    "invalid domain: '{domain}'"
                )));
            }
        }
        Ok(())
    }
}
