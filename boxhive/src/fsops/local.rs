//! Local filesystem implementation of [`FolderOps`].

use std::path::Path;
use std::time::{Duration, Instant};

use walkdir::WalkDir;

use crate::errors::{BoxhiveError, BoxhiveResult};
use crate::fsops::FolderOps;

/// Stock [`FolderOps`] over the local filesystem.
///
/// Quiescence is probed with a self-rename: a folder that can be renamed
/// onto itself has no competing holder. Busy probes are retried on a fixed
/// interval until a bounded wait expires.
#[derive(Debug, Clone)]
pub struct LocalFolderOps {
    poll_interval: Duration,
    wait_timeout: Duration,
}

impl LocalFolderOps {
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            wait_timeout: Duration::from_secs(10),
        }
    }

    /// Override the probe timing. Tests shrink both to keep busy-folder
    /// scenarios fast.
    pub fn with_timing(poll_interval: Duration, wait_timeout: Duration) -> Self {
        Self {
            poll_interval,
            wait_timeout,
        }
    }
}

impl Default for LocalFolderOps {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderOps for LocalFolderOps {
    fn wait_for_folder(&self, path: &Path) -> BoxhiveResult<()> {
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            match std::fs::rename(path, path) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
                Err(e) => {
                    if Instant::now() >= deadline {
                        return Err(BoxhiveError::io_at(
                            "timed out waiting for folder",
                            path,
                            &e,
                        ));
                    }
                    tracing::debug!(path = %path.display(), error = %e, "folder busy, retrying");
                    std::thread::sleep(self.poll_interval);
                }
            }
        }
    }

    fn delete_folder_recursive(&self, path: &Path) -> BoxhiveResult<()> {
        match std::fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BoxhiveError::io_at("failed to delete folder", path, &e)),
        }
    }

    fn rename_folder(
        &self,
        src: &Path,
        dest_parent: &Path,
        dest_name: &str,
    ) -> BoxhiveResult<()> {
        match std::fs::symlink_metadata(src) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(BoxhiveError::io_at("failed to stat folder", src, &e)),
        }
        std::fs::create_dir_all(dest_parent)
            .map_err(|e| BoxhiveError::io_at("failed to create folder", dest_parent, &e))?;
        let dest = dest_parent.join(dest_name);
        std::fs::rename(src, &dest).map_err(|e| {
            BoxhiveError::storage(format!(
                "failed to move {} to {}: {e}",
                src.display(),
                dest.display()
            ))
        })
    }

    fn merge_folder(&self, source: &Path, target: &Path) -> BoxhiveResult<()> {
        std::fs::create_dir_all(target)
            .map_err(|e| BoxhiveError::io_at("failed to create folder", target, &e))?;

        // Materialize the walk before moving anything out from under it.
        let entries: Vec<walkdir::DirEntry> = WalkDir::new(source)
            .follow_links(false)
            .into_iter()
            .collect::<Result<_, _>>()
            .map_err(|e| BoxhiveError::storage(format!("failed to walk {}: {e}", source.display())))?;

        for entry in entries {
            let rel = match entry.path().strip_prefix(source) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel,
                _ => continue,
            };
            let dest = target.join(rel);
            if entry.file_type().is_dir() {
                merge_dir(&dest)?;
            } else {
                merge_entry(entry.path(), &dest)?;
            }
        }

        // Consume the hollowed-out source tree.
        self.delete_folder_recursive(source)
    }
}

/// Make room for a directory at `dest`: an existing directory is reused,
/// anything else loses to the incoming directory.
fn merge_dir(dest: &Path) -> BoxhiveResult<()> {
    match std::fs::symlink_metadata(dest) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => {
            std::fs::remove_file(dest)
                .map_err(|e| BoxhiveError::io_at("failed to replace entry", dest, &e))?;
            std::fs::create_dir(dest)
                .map_err(|e| BoxhiveError::io_at("failed to create folder", dest, &e))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => std::fs::create_dir_all(dest)
            .map_err(|e| BoxhiveError::io_at("failed to create folder", dest, &e)),
        Err(e) => Err(BoxhiveError::io_at("failed to stat entry", dest, &e)),
    }
}

/// Move a file or symlink from `src` over whatever sits at `dest`.
fn merge_entry(src: &Path, dest: &Path) -> BoxhiveResult<()> {
    match std::fs::symlink_metadata(dest) {
        Ok(meta) if meta.is_dir() => {
            std::fs::remove_dir_all(dest)
                .map_err(|e| BoxhiveError::io_at("failed to replace folder", dest, &e))?;
        }
        Ok(_) => {
            std::fs::remove_file(dest)
                .map_err(|e| BoxhiveError::io_at("failed to replace entry", dest, &e))?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(BoxhiveError::io_at("failed to stat entry", dest, &e)),
    }
    std::fs::rename(src, dest).map_err(|e| {
        BoxhiveError::storage(format!(
            "failed to move {} to {}: {e}",
            src.display(),
            dest.display()
        ))
    })
}
