//! Exclusive build lock on `<field>.rail.lock`
//!
//! Serializes rail builders across threads and processes. The lock is
//! released when the guard (and with it the file handle) is dropped.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;

use railstat_core::{RailError, RailResult};
use tracing::{debug, info};

use crate::config::LockPolicy;

/// Held exclusive lock; dropping it releases the lock.
#[derive(Debug)]
pub struct BuildLock {
    path: PathBuf,
    _file: File,
}

impl BuildLock {
    /// Lock file path for the rail at `rail_path`.
    pub fn path_for(rail_path: &Path) -> PathBuf {
        rail_path.with_extension("rail.lock")
    }

    /// Acquire the lock at `path` according to `policy`.
    ///
    /// # Errors
    ///
    /// [`RailError::LockContention`] when the lock is held and the policy is
    /// fail-fast; I/O errors opening or locking the file.
    pub fn acquire(path: &Path, policy: LockPolicy) -> RailResult<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)?;

        match fs2::FileExt::try_lock_exclusive(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => match policy {
                LockPolicy::FailFast => {
                    return Err(RailError::LockContention {
                        path: path.to_path_buf(),
                    });
                }
                LockPolicy::Block => {
                    info!(target: "railstat::rail", path = %path.display(), "Waiting for rail build lock");
                    let started = Instant::now();
                    fs2::FileExt::lock_exclusive(&file)?;
                    info!(
                        target: "railstat::rail",
                        path = %path.display(),
                        waited_ms = started.elapsed().as_millis() as u64,
                        "Acquired rail build lock"
                    );
                }
            },
            Err(e) => return Err(e.into()),
        }
        debug!(target: "railstat::rail", path = %path.display(), "Rail build lock held");

        Ok(BuildLock {
            path: path.to_path_buf(),
            _file: file,
        })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
