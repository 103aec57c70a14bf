//! Exclusive store locks.
//!
//! File-backed stores lock through a sibling `.lock` file created with
//! `create_new`. The file holds a token unique to its holder; a guard only
//! removes the file while it still carries its own token, so a holder whose
//! lock was broken cannot release somebody else's. A lock file older than
//! [`STALE_AFTER`] is considered abandoned by a crashed holder and is broken
//! by moving it aside under a unique name before deleting it.
//!
//! In-memory stores lock through a [`SharedLock`] owned by the store.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use anyhow::Context;

use crate::error::{CoreError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Age after which a lock file is assumed to belong to a dead holder.
pub const STALE_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug)]
#[must_use = "the lock is released when the guard is dropped"]
pub struct StoreLock {
    held: Held,
}

#[derive(Debug)]
enum Held {
    Nothing,
    File { path: PathBuf, token: String },
    Shared(Arc<SharedLock>),
}

impl StoreLock {
    /// A guard that holds nothing, for stores whose callers serialise access
    /// themselves.
    pub fn unlocked() -> Self {
        Self {
            held: Held::Nothing,
        }
    }

    /// Take the lock file at `path`, polling until `timeout` has elapsed.
    ///
    /// # Errors
    /// [`CoreError::LockTimeout`] when another live holder keeps the file for
    /// longer than `timeout`; I/O failures otherwise.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create lock directory: {}", parent.display())
            })?;
        }

        let token = holder_token();
        let started = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    if let Err(e) = file.write_all(token.as_bytes()) {
                        let _ = fs::remove_file(path);
                        return Err(anyhow::Error::new(e)
                            .context(format!("Failed to write lock file: {}", path.display()))
                            .into());
                    }
                    return Ok(Self {
                        held: Held::File {
                            path: path.to_path_buf(),
                            token,
                        },
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if is_stale(path, STALE_AFTER) {
                        break_stale(path, &token);
                        continue;
                    }
                    if started.elapsed() >= timeout {
                        return Err(CoreError::LockTimeout {
                            path: path.to_path_buf(),
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("Failed to create lock file: {}", path.display()))
                        .into());
                }
            }
        }
    }

    /// Lock file backing this guard, if any.
    pub fn path(&self) -> Option<&Path> {
        match &self.held {
            Held::File { path, .. } => Some(path),
            Held::Nothing | Held::Shared(_) => None,
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        match std::mem::replace(&mut self.held, Held::Nothing) {
            Held::Nothing => {}
            Held::Shared(lock) => lock.release(),
            Held::File { path, token } => release_file(&path, &token),
        }
    }
}

/// Blocking exclusive lock shared by every handle to one in-memory store.
#[derive(Debug, Default)]
pub struct SharedLock {
    held: Mutex<bool>,
    released: Condvar,
}

impl SharedLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until no other guard is alive, then hand out a new one.
    pub fn acquire(self: &Arc<Self>) -> StoreLock {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while *held {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *held = true;
        StoreLock {
            held: Held::Shared(Arc::clone(self)),
        }
    }

    fn release(&self) {
        *self.held.lock().unwrap_or_else(PoisonError::into_inner) = false;
        self.released.notify_one();
    }
}

fn holder_token() -> String {
    format!("{}-{}", std::process::id(), uuid::Uuid::new_v4())
}

fn release_file(path: &Path, token: &str) {
    match fs::read_to_string(path) {
        Ok(content) if content == token => {
            if let Err(e) = fs::remove_file(path) {
                tracing::warn!(lock = %path.display(), error = %e, "failed to release store lock");
            }
        }
        Ok(_) => {
            tracing::warn!(
                lock = %path.display(),
                "store lock was taken over by another holder; leaving it in place"
            );
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(lock = %path.display(), "store lock vanished before release");
        }
        Err(e) => {
            tracing::warn!(lock = %path.display(), error = %e, "failed to read store lock");
        }
    }
}

/// Move a stale lock aside and delete it.
///
/// The rename is atomic, so of several waiters seeing the same stale file
/// only one moves it. If the file moved aside turns out to be fresh (a new
/// holder created it after the staleness check), it is linked back into
/// place.
fn break_stale(path: &Path, token: &str) {
    let mut aside_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    aside_name.push(format!(".{token}.stale"));
    let aside = path.with_file_name(aside_name);

    if fs::rename(path, &aside).is_err() {
        return;
    }

    if is_stale(&aside, STALE_AFTER) {
        tracing::warn!(lock = %path.display(), "broke stale store lock");
    } else if let Err(e) = fs::hard_link(&aside, path) {
        tracing::warn!(
            lock = %path.display(),
            error = %e,
            "failed to restore a live store lock moved aside"
        );
    }
    let _ = fs::remove_file(&aside);
}

fn is_stale(path: &Path, max_age: Duration) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > max_age)
}
