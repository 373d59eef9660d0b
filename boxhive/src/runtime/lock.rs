//! Runtime lock preventing concurrent runtimes on one home directory.
//!
//! Destructive folder operations are not serialized against each other by
//! the engine, so two runtimes mutating the same home would race. File
//! locking (flock) keeps it to one runtime per `BOXHIVE_HOME` at a time.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::errors::{BoxhiveError, BoxhiveResult};
use crate::runtime::constants::filenames;

/// A guard holding an exclusive lock on the runtime home directory.
///
/// The lock is released when this guard is dropped, or by the OS when the
/// process exits.
#[derive(Debug)]
pub struct HomeLock {
    #[allow(dead_code)] // Held for lifetime, not directly accessed
    file: File,
    path: PathBuf,
}

impl HomeLock {
    /// Attempt to acquire an exclusive lock on the home directory.
    ///
    /// Fails when another runtime already holds the lock.
    pub fn acquire(home_dir: &Path) -> BoxhiveResult<Self> {
        std::fs::create_dir_all(home_dir)
            .map_err(|e| BoxhiveError::io_at("failed to create home dir", home_dir, &e))?;

        let lock_path = home_dir.join(filenames::LOCK_FILE);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| BoxhiveError::io_at("failed to open lock file", &lock_path, &e))?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;

            let fd = file.as_raw_fd();
            let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };

            if result != 0 {
                let err = std::io::Error::last_os_error();
                if err.kind() == std::io::ErrorKind::WouldBlock {
                    return Err(BoxhiveError::Internal(format!(
                        "another boxhive runtime is already using directory: {}\n\
                         Only one runtime instance can use a home directory at a time.",
                        home_dir.display()
                    )));
                } else {
                    return Err(BoxhiveError::io("failed to acquire lock", &err));
                }
            }
        }

        #[cfg(not(unix))]
        {
            tracing::debug!(
                lock_path = %lock_path.display(),
                "file locking not available on this platform; lock file is advisory only"
            );
        }

        tracing::debug!(lock_path = %lock_path.display(), "Acquired runtime lock");

        Ok(HomeLock {
            file,
            path: lock_path,
        })
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for HomeLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            let fd = self.file.as_raw_fd();
            unsafe {
                libc::flock(fd, libc::LOCK_UN);
            }
        }

        tracing::debug!(lock_path = %self.path.display(), "Released runtime lock");
    }
}
