//! Advisory cross-process lock for the store file.
//!
//! Multiple independently scheduled invocations (cron, a Nagios check, a
//! long-running loop) share one store; the lock serializes whole poll
//! cycles. Acquisition is non-blocking: a busy lock must make the caller
//! abort its cycle cleanly at normal severity, never stall a check.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, TrafmonError};

/// Exclusive lockfile held for the duration of one poll cycle.
///
/// Created with `O_CREAT | O_EXCL`; the file's existence is the lock. It is
/// unlinked on release and on drop, including error paths.
#[derive(Debug)]
pub struct CycleLock {
    path: PathBuf,
    released: bool,
}

impl CycleLock {
    /// Try to take the lock. Fails with [`TrafmonError::LockBusy`] when
    /// another process already holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                // Owner pid, for operators inspecting a stale lock by hand.
                let _ = writeln!(file, "{}", std::process::id());
                Ok(Self {
                    path: path.to_path_buf(),
                    released: false,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(TrafmonError::LockBusy(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Conventional lock path for a given store path.
    pub fn path_for_store(store_path: &Path) -> PathBuf {
        let mut os = store_path.as_os_str().to_os_string();
        os.push(".lock");
        PathBuf::from(os)
    }

    /// Release explicitly (drop does the same).
    pub fn release(mut self) {
        self.unlink();
    }

    fn unlink(&mut self) {
        if !self.released {
            self.released = true;
            if let Err(e) = fs::remove_file(&self.path) {
                log::warn!("failed to remove lockfile {}: {}", self.path.display(), e);
            }
        }
    }
}

impl Drop for CycleLock {
    fn drop(&mut self) {
        self.unlink();
    }
}
