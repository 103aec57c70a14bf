use std::sync::{Arc, Mutex, PoisonError};

use super::{ProjectRepository, SharedLock, StoreLock};
use crate::error::Result;
use crate::project::Projects;

/// In-memory project pool.
///
/// Every handle to the store (through `Arc` or a shared reference) locks the
/// same [`SharedLock`], so several reservation pools may sit on one store.
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    projects: Mutex<Projects>,
    lock: Arc<SharedLock>,
}

impl MemoryProjectStore {
    pub fn new(projects: Projects) -> Self {
        Self {
            projects: Mutex::new(projects),
            lock: Arc::new(SharedLock::new()),
        }
    }

    /// Copy of the current pool, without taking the store lock.
    pub fn snapshot(&self) -> Projects {
        self.projects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProjectRepository for MemoryProjectStore {
    fn load_all(&self) -> Result<Projects> {
        Ok(self.snapshot())
    }

    fn save_all(&self, projects: &Projects) -> Result<()> {
        *self.projects.lock().unwrap_or_else(PoisonError::into_inner) = projects.clone();
        Ok(())
    }

    /// Blocks while another guard for this store is alive.
    fn lock(&self) -> Result<StoreLock> {
        Ok(self.lock.acquire())
    }
}
