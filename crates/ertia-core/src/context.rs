//! Application context for unified dependency injection.

use std::fs;

use anyhow::Context;

use crate::config::{ErtiaPaths, Settings, load_settings};
use crate::error::{CoreError, Result};
use crate::keys::Ed25519KeyGenerator;
use crate::node::{RetryOutcome, sub_domain_of};
use crate::pool::ReservationPool;
use crate::project::{Project, ProjectOptions};
use crate::store::{JsonProjectStore, ProjectRepository};

/// Paths and settings resolved once, plus factories for the services built
/// on them. Embedding applications create this at startup and pass it down.
#[derive(Debug, Clone)]
pub struct AppContext {
    paths: ErtiaPaths,
    settings: Settings,
}

impl AppContext {
    pub fn new(paths: ErtiaPaths, settings: Settings) -> Self {
        Self { paths, settings }
    }

    /// Resolve paths from the environment and read `settings.toml` if present.
    pub fn from_env() -> Result<Self> {
        let paths = ErtiaPaths::from_env();
        let settings = load_settings(&paths.settings_path())?;
        tracing::debug!(
            context = paths.context(),
            root = %paths.root().display(),
            "resolved ertia context"
        );
        Ok(Self::new(paths, settings))
    }

    pub fn paths(&self) -> &ErtiaPaths {
        &self.paths
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Create the data, keys and kube directories.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            self.paths.root(),
            self.paths.keys_dir(),
            self.paths.kube_dir(),
        ] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn project_store(&self) -> JsonProjectStore {
        JsonProjectStore::new(self.paths.projects_path())
            .with_lock_timeout(self.settings.lock_timeout())
    }

    pub fn reservation_pool(&self) -> ReservationPool<JsonProjectStore> {
        ReservationPool::new(self.project_store()).with_grace_time(self.settings.grace_time())
    }

    /// Options seeded with the configured default provider and a random
    /// domain under the configured parent domain.
    pub fn project_options(&self) -> ProjectOptions {
        let domain = sub_domain_of(&self.settings.default_domain);
        ProjectOptions::new()
            .with_provider(self.settings.default_provider.clone())
            .with_domain(domain.trim_start_matches('.'))
    }

    pub fn key_generator(&self) -> Ed25519KeyGenerator {
        Ed25519KeyGenerator::new().with_comment(format!("ertia@{}", self.paths.context()))
    }

    /// Build a project with a fresh key pair and stage it in the pool.
    pub fn create_project(&self, options: ProjectOptions) -> Result<Project> {
        let mut project = Project::new(options, &self.key_generator())?;
        project.context = self.paths.context().to_string();
        self.reservation_pool().stage(project.clone())?;
        Ok(project)
    }

    /// Escalate a node's retry counter with the configured cap and persist
    /// its project.
    pub fn retry_node(&self, project_id: &str, node_id: &str) -> Result<RetryOutcome> {
        let store = self.project_store();
        let _lock = store.lock()?;
        let mut projects = store.load_all()?;
        let node = projects
            .get_mut(project_id)
            .ok_or_else(|| CoreError::ProjectNotFound {
                id: project_id.to_string(),
            })?
            .find_node_by_id_mut(node_id)
            .ok_or_else(|| CoreError::NodeNotFound {
                id: node_id.to_string(),
            })?;

        let outcome = node.retry_with_limit(self.settings.max_node_retries);
        node.updated = chrono::Utc::now();
        store.save_all(&projects)?;
        Ok(outcome)
    }
}
