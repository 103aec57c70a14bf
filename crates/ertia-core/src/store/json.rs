//! JSON file persistence for project documents.
//!
//! The pool lives in a single pretty-printed JSON array. Writes go to a temp
//! file in the same directory and are renamed over the target, so readers see
//! either the old or the new document and never a torn one.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Context;

use super::{ProjectRepository, StoreLock};
use crate::error::{CoreError, Result};
use crate::project::{Project, Projects};

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// File-backed project pool.
#[derive(Debug, Clone)]
pub struct JsonProjectStore {
    path: PathBuf,
    lock_timeout: Duration,
}

impl JsonProjectStore {
    /// Store backed by the JSON array at `path`. The file is created on the
    /// first save.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// How long [`ProjectRepository::lock`] waits for another holder.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<file>.lock` next to the store file.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "projects.json".into());
        name.push(".lock");
        self.path.with_file_name(name)
    }
}

impl ProjectRepository for JsonProjectStore {
    /// A missing file is an empty pool.
    ///
    /// Projects that break their own invariants are kept (so the next save
    /// writes them back untouched) but logged; they are never reservable.
    /// Duplicate project ids fail the load.
    fn load_all(&self) -> Result<Projects> {
        if !self.path.exists() {
            return Ok(Projects::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read projects file: {}", self.path.display()))?;
        let projects = Projects::from_json(&content)
            .with_context(|| format!("Failed to parse projects file: {}", self.path.display()))?;
        projects.validate_ids()?;
        for (project, reason) in projects.invalid() {
            tracing::warn!(
                path = %self.path.display(),
                project = %project.id,
                %reason,
                "loaded inconsistent project"
            );
        }
        Ok(projects)
    }

    fn save_all(&self, projects: &Projects) -> Result<()> {
        let content = projects.to_json()?;
        write_atomic(&self.path, content.as_bytes())?;
        tracing::debug!(path = %self.path.display(), projects = projects.len(), "saved projects");
        Ok(())
    }

    fn lock(&self) -> Result<StoreLock> {
        StoreLock::acquire(&self.lock_path(), self.lock_timeout)
    }
}

/// Read a single-project document.
pub fn read_project(path: &Path) -> Result<Project> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read project file: {}", path.display()))?;
    let project = Project::from_json(&content)
        .with_context(|| format!("Failed to parse project file: {}", path.display()))?;
    project.validate()?;
    Ok(project)
}

/// Write a single-project document atomically.
pub fn write_project(path: &Path, project: &Project) -> Result<()> {
    let mut content = Vec::new();
    project.write_json(&mut content)?;
    write_atomic(path, &content)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create store directory: {}", dir.display()))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| CoreError::Persistence(anyhow::anyhow!(
            "Store path has no file name: {}",
            path.display()
        )))?
        .to_string_lossy();
    let tmp_path = dir.join(format!(
        ".{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    fs::write(&tmp_path, bytes)
        .with_context(|| format!("Failed to write tmp file: {}", tmp_path.display()))?;

    // rename() does not replace an existing file on Windows
    #[cfg(windows)]
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove existing file: {}", path.display()))?;
    }

    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to rename tmp file: {}", tmp_path.display()))?;
    Ok(())
}
