//! Reservation pool over a warm pool of pre-staged projects.
//!
//! Selection is deterministic: the first free project in collection order
//! wins. The pool only stamps deletion deadlines; reclaiming expired projects
//! is left to an external reaper that inspects [`Project::is_expired`].

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::error::{CoreError, Result};
use crate::project::{Project, Projects, default_grace_time, reservation_deadline};
use crate::store::ProjectRepository;

impl Projects {
    /// Reserve the first free project, stamping `now + grace` as its deadline.
    ///
    /// Returns [`CoreError::PoolExhausted`] and leaves the collection untouched
    /// when nothing is free.
    pub fn reserve_one(&mut self, grace: Duration) -> Result<&Project> {
        self.reserve_one_at(Utc::now(), grace)
    }

    /// [`reserve_one`](Self::reserve_one) at a fixed reservation time.
    ///
    /// # Errors
    /// [`CoreError::InvalidGraceTime`] before anything is selected when
    /// `grace` is unusable, [`CoreError::PoolExhausted`] when nothing is free.
    pub fn reserve_one_at(&mut self, now: DateTime<Utc>, grace: Duration) -> Result<&Project> {
        reservation_deadline(now, grace)?;
        let project = self
            .projects_mut()
            .iter_mut()
            .find(|p| p.is_reservable())
            .ok_or(CoreError::PoolExhausted)?;

        project.reserve_at(now, grace)?;
        Ok(&*project)
    }

    /// Number of projects [`reserve_one`](Self::reserve_one) could still
    /// hand out.
    pub fn reservable_count(&self) -> usize {
        self.iter().filter(|p| p.is_reservable()).count()
    }

    /// Projects whose deletion deadline is at or before `now`.
    pub fn expired(&self, now: DateTime<Utc>) -> Vec<&Project> {
        self.iter().filter(|p| p.is_expired(now)).collect()
    }
}

/// Single coordinating owner for reservations against one repository.
///
/// Every mutation runs lock, load, mutate and persist as one critical
/// section: the in-process mutex serialises threads sharing this pool and the
/// repository lock serialises processes sharing the stored document. A
/// reservation is handed out only after it has been persisted.
pub struct ReservationPool<R> {
    repository: R,
    grace: Duration,
    guard: Mutex<()>,
}

impl<R: ProjectRepository> ReservationPool<R> {
    /// Pool over `repository` with the default grace period.
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            grace: default_grace_time(),
            guard: Mutex::new(()),
        }
    }

    /// Override the grace period. A grace that is not positive, or that
    /// pushes the deadline out of range, makes [`reserve`](Self::reserve)
    /// fail with [`CoreError::InvalidGraceTime`].
    pub fn with_grace_time(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn grace_time(&self) -> Duration {
        self.grace
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Claim one free project.
    ///
    /// # Returns
    /// The project as persisted, with `reserved` set and its deletion
    /// deadline stamped.
    ///
    /// # Errors
    /// - [`CoreError::PoolExhausted`] when nothing is free; nothing is written.
    /// - [`CoreError::InvalidGraceTime`] for an unusable grace period.
    /// - Lock and persistence failures from the repository. In that case no
    ///   reservation was recorded.
    pub fn reserve(&self) -> Result<Project> {
        self.reserve_at(Utc::now())
    }

    /// [`reserve`](Self::reserve) with an explicit reservation time.
    pub fn reserve_at(&self, now: DateTime<Utc>) -> Result<Project> {
        self.with_projects(|projects| {
            match projects.reserve_one_at(now, self.grace).cloned() {
                Ok(project) => Ok((true, project)),
                Err(CoreError::PoolExhausted) => {
                    tracing::warn!(pool = projects.len(), "no reservable projects left");
                    Err(CoreError::PoolExhausted)
                }
                Err(e) => Err(e),
            }
        })
        .inspect(|project| {
            tracing::info!(
                project = %project.id,
                deadline = ?project.delete_at,
                "reserved project"
            );
        })
    }

    /// Add a pre-created project to the pool.
    pub fn stage(&self, project: Project) -> Result<()> {
        project.validate()?;
        let id = project.id.clone();
        self.with_projects(|projects| {
            projects.insert(project)?;
            Ok((true, ()))
        })?;
        tracing::debug!(project = %id, "staged project");
        Ok(())
    }

    /// Number of projects that a call to [`reserve`](Self::reserve) could hand out.
    pub fn available(&self) -> Result<usize> {
        self.with_projects(|projects| Ok((false, projects.reservable_count())))
    }

    /// Snapshot of projects past their deletion deadline.
    pub fn expired(&self, now: DateTime<Utc>) -> Result<Vec<Project>> {
        self.with_projects(|projects| {
            let expired = projects.expired(now).into_iter().cloned().collect();
            Ok((false, expired))
        })
    }

    /// Run `f` inside the critical section. `f` returns whether it changed the
    /// collection; changed collections are persisted before the lock is
    /// released.
    fn with_projects<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Projects) -> Result<(bool, T)>,
    {
        let _local = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let _store = self.repository.lock()?;

        let mut projects = self.repository.load_all()?;
        let (changed, value) = f(&mut projects)?;
        if changed {
            self.repository.save_all(&projects)?;
        }
        Ok(value)
    }
}
