//! Load/persist collaborators for project documents.
//!
//! The core only talks to [`ProjectRepository`]. [`JsonProjectStore`] keeps
//! the whole pool in one JSON file; [`MemoryProjectStore`] is for embedding
//! and tests.

pub mod json;
pub mod lock;
pub mod memory;

use crate::error::{CoreError, Result};
use crate::project::{Project, Projects};

pub use json::{JsonProjectStore, read_project, write_project};
pub use lock::{SharedLock, StoreLock};
pub use memory::MemoryProjectStore;

pub trait ProjectRepository: Send + Sync {
    /// The whole pool, in stored order.
    fn load_all(&self) -> Result<Projects>;

    /// Replace the stored pool. Callers that read first hold [`lock`](Self::lock).
    fn save_all(&self, projects: &Projects) -> Result<()>;

    /// Exclusive access to the stored document until the guard is dropped.
    ///
    /// Not re-entrant: do not call [`save`](Self::save) while holding it.
    fn lock(&self) -> Result<StoreLock>;

    /// One project by id, or [`CoreError::ProjectNotFound`].
    fn load(&self, id: &str) -> Result<Project> {
        self.load_all()?
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::ProjectNotFound { id: id.to_string() })
    }

    /// Insert or replace one project under the store lock.
    fn save(&self, project: &Project) -> Result<()> {
        project.validate()?;
        let _lock = self.lock()?;
        let mut projects = self.load_all()?;
        projects.upsert(project.clone());
        self.save_all(&projects)
    }

    /// Remove one project under the store lock.
    fn delete(&self, id: &str) -> Result<Project> {
        let _lock = self.lock()?;
        let mut projects = self.load_all()?;
        let removed = projects.remove(id)?;
        self.save_all(&projects)?;
        Ok(removed)
    }
}

impl<R: ProjectRepository + ?Sized> ProjectRepository for std::sync::Arc<R> {
    fn load_all(&self) -> Result<Projects> {
        (**self).load_all()
    }

    fn save_all(&self, projects: &Projects) -> Result<()> {
        (**self).save_all(projects)
    }

    fn lock(&self) -> Result<StoreLock> {
        (**self).lock()
    }
}
