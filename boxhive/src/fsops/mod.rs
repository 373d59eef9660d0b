//! Folder transaction seam.
//!
//! Every destructive folder step (delete, rename, merge) goes through the
//! [`FolderOps`] trait so the snapshot engine can be exercised against
//! instrumented implementations. [`LocalFolderOps`] is the stock local
//! filesystem implementation.
//!
//! The `*_with_progress` helpers layer the shared long-operation protocol on
//! top of the trait: announce the step, wait for the folder to go quiescent,
//! honor a pending cancel request, then perform the destructive call.

pub mod local;

pub use local::LocalFolderOps;

use std::path::Path;

use crate::errors::{BoxhiveError, BoxhiveResult};
use crate::progress::OpProgress;

pub trait FolderOps: Send + Sync + 'static {
    /// Block until nothing external is holding `path`, or fail once a
    /// bounded wait expires. An absent folder is quiescent.
    fn wait_for_folder(&self, path: &Path) -> BoxhiveResult<()>;

    /// Recursively delete `path`. Deleting an absent folder is a no-op.
    fn delete_folder_recursive(&self, path: &Path) -> BoxhiveResult<()>;

    /// Move `src` to `dest_parent/dest_name`. Moving an absent source is a
    /// no-op; the destination parent is created when missing.
    fn rename_folder(&self, src: &Path, dest_parent: &Path, dest_name: &str)
    -> BoxhiveResult<()>;

    /// Physically merge `source` into `target`. Source entries win on
    /// conflict and the source folder is consumed.
    fn merge_folder(&self, source: &Path, target: &Path) -> BoxhiveResult<()>;
}

/// Delete `path` under the long-operation protocol.
pub(crate) fn delete_with_progress(
    ops: &dyn FolderOps,
    progress: &OpProgress,
    path: &Path,
) -> BoxhiveResult<()> {
    if !path.exists() {
        return Ok(());
    }
    progress.show_message(format!("Waiting for folder: {}", path.display()));
    ops.wait_for_folder(path)?;
    progress.check_cancelled()?;
    progress.show_message(format!("Deleting folder: {}", path.display()));
    ops.delete_folder_recursive(path)
}

/// Merge `source` into `target` under the long-operation protocol.
///
/// An absent source is a completed merge. The target is created when
/// missing; both folders are waited on (source first) before any content
/// moves.
pub(crate) fn merge_with_progress(
    ops: &dyn FolderOps,
    progress: &OpProgress,
    source: &Path,
    target: &Path,
) -> BoxhiveResult<()> {
    if !source.exists() {
        return Ok(());
    }
    progress.show_message(format!("Waiting for folder: {}", source.display()));
    ops.wait_for_folder(source)?;

    if !target.exists() {
        std::fs::create_dir_all(target)
            .map_err(|e| BoxhiveError::io_at("failed to create merge target", target, &e))?;
    }
    progress.show_message(format!("Waiting for folder: {}", target.display()));
    ops.wait_for_folder(target)?;

    progress.check_cancelled()?;
    progress.show_message(format!(
        "Merging folders: {} >> {}",
        source.display(),
        target.display()
    ));
    ops.merge_folder(source, target).map_err(|e| {
        BoxhiveError::storage(format!(
            "contents of {} have not been fully merged into {}: {e}",
            source.display(),
            target.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::channel;
    use tempfile::TempDir;

    #[test]
    fn test_delete_skips_absent_folder_silently() {
        let temp = TempDir::new().unwrap();
        let (progress, handle) = channel();
        let ops = LocalFolderOps::new();

        delete_with_progress(&ops, &progress, &temp.path().join("missing")).unwrap();
        // No folder, no announcements.
        assert_eq!(handle.latest_message(), "");
    }

    #[test]
    fn test_delete_announces_wait_then_delete() {
        let temp = TempDir::new().unwrap();
        let victim = temp.path().join("victim");
        std::fs::create_dir(&victim).unwrap();

        let (progress, handle) = channel();
        delete_with_progress(&LocalFolderOps::new(), &progress, &victim).unwrap();

        assert!(!victim.exists());
        assert!(handle.latest_message().starts_with("Deleting folder:"));
    }

    #[test]
    fn test_delete_honors_cancel_before_destruction() {
        let temp = TempDir::new().unwrap();
        let victim = temp.path().join("victim");
        std::fs::create_dir(&victim).unwrap();

        let (progress, handle) = channel();
        handle.request_cancel();
        let err = delete_with_progress(&LocalFolderOps::new(), &progress, &victim).unwrap_err();

        assert!(err.is_aborted());
        assert!(victim.exists());
    }

    #[test]
    fn test_merge_treats_absent_source_as_done() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("target");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep.txt"), "x").unwrap();

        let (progress, _handle) = channel();
        merge_with_progress(
            &LocalFolderOps::new(),
            &progress,
            &temp.path().join("missing"),
            &target,
        )
        .unwrap();

        assert!(target.join("keep.txt").exists());
    }

    #[test]
    fn test_merge_creates_missing_target() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        std::fs::create_dir(&source).unwrap();
        std::fs::write(source.join("a.txt"), "a").unwrap();
        let target = temp.path().join("target");

        let (progress, _handle) = channel();
        merge_with_progress(&LocalFolderOps::new(), &progress, &source, &target).unwrap();

        assert_eq!(std::fs::read_to_string(target.join("a.txt")).unwrap(), "a");
        assert!(!source.exists());
    }

    #[test]
    fn test_merge_failure_names_both_folders() {
        struct BrokenMerge(LocalFolderOps);
        impl FolderOps for BrokenMerge {
            fn wait_for_folder(&self, path: &Path) -> BoxhiveResult<()> {
                self.0.wait_for_folder(path)
            }
            fn delete_folder_recursive(&self, path: &Path) -> BoxhiveResult<()> {
                self.0.delete_folder_recursive(path)
            }
            fn rename_folder(
                &self,
                src: &Path,
                dest_parent: &Path,
                dest_name: &str,
            ) -> BoxhiveResult<()> {
                self.0.rename_folder(src, dest_parent, dest_name)
            }
            fn merge_folder(&self, _source: &Path, _target: &Path) -> BoxhiveResult<()> {
                Err(BoxhiveError::storage("simulated failure"))
            }
        }

        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let target = temp.path().join("target");
        std::fs::create_dir(&source).unwrap();
        std::fs::create_dir(&target).unwrap();

        let (progress, _handle) = channel();
        let err = merge_with_progress(&BrokenMerge(LocalFolderOps::new()), &progress, &source, &target)
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("not been fully merged"));
        assert!(text.contains("source"));
        assert!(text.contains("target"));
    }
}
