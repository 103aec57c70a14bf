//! Data directory resolution.
//!
//! Paths are resolved once at startup from the environment and passed around
//! explicitly afterwards.

use std::path::{Path, PathBuf};

pub const ENV_DIR: &str = "ERTIADIR";
pub const ENV_CONFIG: &str = "ERTIACONFIG";
pub const ENV_KEYS: &str = "ERTIAKEYS";
pub const ENV_KUBE: &str = "ERTIAKUBE";
pub const ENV_CONTEXT: &str = "ERTIACONTEXT";

pub const DEFAULT_CONTEXT: &str = "DEFAULT";

/// Used when no home directory can be determined.
const FALLBACK_HOME: &str = "/opt/ertia";

/// Resolved locations for one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErtiaPaths {
    context: String,
    root: PathBuf,
    config_path: PathBuf,
    keys_dir: PathBuf,
    kube_dir: PathBuf,
}

impl ErtiaPaths {
    pub fn from_env() -> Self {
        Self::resolve(|key| std::env::var(key).ok(), dirs::home_dir())
    }

    /// Resolve with an explicit variable lookup and home directory.
    ///
    /// `ERTIADIR` replaces `<home>/.ertia/<context>` as the root; the other
    /// variables override single locations under it.
    pub fn resolve<F>(lookup: F, home_dir: Option<PathBuf>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let context = lookup(ENV_CONTEXT)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTEXT.to_string());

        let root = lookup(ENV_DIR).map(PathBuf::from).unwrap_or_else(|| {
            home_dir
                .unwrap_or_else(|| PathBuf::from(FALLBACK_HOME))
                .join(".ertia")
                .join(&context)
        });

        let config_path = lookup(ENV_CONFIG)
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join("config.json"));
        let keys_dir = lookup(ENV_KEYS)
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join(".ssh"));
        let kube_dir = lookup(ENV_KUBE)
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join(".kube"));

        Self {
            context,
            root,
            config_path,
            keys_dir,
            kube_dir,
        }
    }

    /// All locations under one root, ignoring the environment.
    pub fn under(root: PathBuf) -> Self {
        Self {
            context: DEFAULT_CONTEXT.to_string(),
            config_path: root.join("config.json"),
            keys_dir: root.join(".ssh"),
            kube_dir: root.join(".kube"),
            root,
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Single-project document for the active context.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn keys_dir(&self) -> &Path {
        &self.keys_dir
    }

    pub fn kube_dir(&self) -> &Path {
        &self.kube_dir
    }

    pub fn kube_config_path(&self) -> PathBuf {
        self.kube_dir.join("config")
    }

    /// The reservation pool document.
    pub fn projects_path(&self) -> PathBuf {
        self.root.join("projects.json")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join("settings.toml")
    }
}
