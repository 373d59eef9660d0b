//! The snapshot tree engine.
//!
//! Snapshots form a forest: each record can point at a parent, and one
//! current pointer names the snapshot the live content was last branched
//! from (empty pointer: the live content has no snapshot ancestry).
//! The engine builds that forest from the metadata store, validates
//! structural preconditions synchronously, then drives the folder
//! transaction sequences:
//!
//! - [`SnapshotEngine::take`] freezes the live content into a new snapshot
//!   folder, synchronously;
//! - [`SnapshotEngine::remove`] deletes a leaf outright, or collapses the
//!   removed snapshot into its single successor (child snapshot or live
//!   content) on a background worker;
//! - [`SnapshotEngine::select`] re-bases the live content onto another
//!   snapshot and wipes the stale live subtrees on a background worker.
//!
//! Multi-step sequences are best effort: a mid-sequence failure is
//! surfaced through the operation status and already-completed steps are
//! not rolled back. Metadata is flushed strictly after the filesystem
//! steps it describes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use crate::errors::{BoxhiveError, BoxhiveResult};
use crate::fsops::{FolderOps, delete_with_progress, merge_with_progress};
use crate::process::ProcessMonitor;
use crate::progress::{OpHandle, OpProgress, spawn_blocking_op};
use crate::runtime::constants::filenames;
use crate::runtime::layout::BoxLayout;
use crate::snapshots::{Confirm, Snapshot, SnapshotId, SnapshotList};
use crate::store::SnapshotStore;

/// Smallest positive integer id not already in use.
fn next_snapshot_id(list: &SnapshotList) -> SnapshotId {
    let used: HashSet<u32> = list.iter().filter_map(|s| s.id.as_number()).collect();
    let mut n = 1;
    while used.contains(&n) {
        n += 1;
    }
    SnapshotId::from_number(n)
}

#[derive(Clone)]
pub(crate) struct SnapshotEngine {
    box_name: String,
    layout: BoxLayout,
    fsops: Arc<dyn FolderOps>,
    monitor: Arc<dyn ProcessMonitor>,
}

impl SnapshotEngine {
    pub(crate) fn new(
        box_name: impl Into<String>,
        layout: BoxLayout,
        fsops: Arc<dyn FolderOps>,
        monitor: Arc<dyn ProcessMonitor>,
    ) -> Self {
        Self {
            box_name: box_name.into(),
            layout,
            fsops,
            monitor,
        }
    }

    fn store(&self) -> BoxhiveResult<SnapshotStore> {
        SnapshotStore::open(self.layout.snapshots_path())
    }

    /// Gate a snapshot mutation on box idleness. Running processes make the
    /// operation risky, not illegal: without confirmation it fails with a
    /// confirmation-required classification, with confirmation it proceeds.
    fn ensure_idle(&self, action: &str, confirm: Confirm) -> BoxhiveResult<()> {
        if !self.monitor.has_active_processes(&self.box_name) {
            return Ok(());
        }
        if confirm.is_confirmed() {
            tracing::warn!(
                box_name = %self.box_name,
                action,
                "proceeding while processes are running in the box"
            );
            return Ok(());
        }
        Err(BoxhiveError::ConfirmationRequired(format!(
            "can't {action} while processes are running in the box"
        )))
    }

    /// All snapshots plus the current pointer. A box that never took a
    /// snapshot yields an empty listing, not an error.
    pub(crate) fn list(&self) -> BoxhiveResult<SnapshotList> {
        Ok(self.store()?.list())
    }

    /// Freeze the live content into a new snapshot and make it current.
    ///
    /// The content subtrees are moved (not copied) into the snapshot folder
    /// in fixed order; the first failed move stops the sequence and the
    /// metadata is never flushed, so the listing does not advertise a
    /// half-taken snapshot. Already-moved subtrees stay moved.
    pub(crate) fn take(&self, name: &str, confirm: Confirm) -> BoxhiveResult<SnapshotId> {
        self.ensure_idle("take a snapshot", confirm)?;

        let mut store = self.store()?;
        let list = store.list();
        let id = next_snapshot_id(&list);
        let snap_dir = self.layout.snapshot_dir(&id);

        std::fs::create_dir_all(self.layout.root()).map_err(|e| {
            BoxhiveError::io_at("failed to create box folder", self.layout.root(), &e)
        })?;
        // A leftover folder under the allocated id is stale state the user
        // has to resolve; do not silently reuse it.
        std::fs::create_dir(&snap_dir)
            .map_err(|e| BoxhiveError::io_at("failed to create snapshot folder", &snap_dir, &e))?;

        let live_hive = self.layout.hive_path();
        if live_hive.exists() {
            std::fs::copy(&live_hive, self.layout.snapshot_hive(&id)).map_err(|e| {
                BoxhiveError::io_at("failed to copy hive into snapshot", &live_hive, &e)
            })?;
        } else {
            tracing::warn!(box_name = %self.box_name, "box has no hive file, snapshot taken without one");
        }

        store.insert(&Snapshot {
            id: id.clone(),
            name: name.to_string(),
            description: String::new(),
            taken_at: Some(Utc::now()),
            parent: list.current().cloned(),
        });

        for subtree in BoxLayout::content_subtrees() {
            self.fsops
                .rename_folder(&self.layout.content_dir(subtree), &snap_dir, subtree)?;
        }

        store.set_current(Some(&id));
        store.flush()?;
        tracing::info!(box_name = %self.box_name, snapshot = %id, name, "snapshot taken");
        Ok(id)
    }

    /// Remove a snapshot, collapsing it into its single successor when one
    /// exists.
    ///
    /// Validation is synchronous: a snapshot with two or more successors
    /// (child snapshots, plus the live content when current) has no
    /// unambiguous merge direction and is refused before anything is
    /// touched. The folder work then runs on a background worker reporting
    /// through the returned handle.
    pub(crate) fn remove(&self, id: &SnapshotId, confirm: Confirm) -> BoxhiveResult<OpHandle> {
        let store = self.store()?;
        let list = store.list();
        if !list.contains(id) {
            return Err(BoxhiveError::SnapshotNotFound(id.to_string()));
        }
        self.ensure_idle("remove a snapshot", confirm)?;

        let children = list.children_of(id);
        let is_current = list.is_current(id);
        if children.len() >= 2 || (children.len() == 1 && is_current) {
            return Err(BoxhiveError::Validation(format!(
                "snapshot {id} is shared by multiple later snapshots"
            )));
        }

        let engine = self.clone();
        let removed = id.clone();
        if children.len() == 1 || is_current {
            let retained = (!is_current).then(|| children[0].id.clone());
            spawn_blocking_op(move |progress| {
                engine.merge_snapshot_worker(progress, &removed, retained.as_ref())
            })
        } else {
            spawn_blocking_op(move |progress| engine.delete_snapshot_worker(progress, &removed))
        }
    }

    /// Re-base the live content onto `id`: swap the live hive for the
    /// snapshot's copy, advance the current pointer, then wipe the live
    /// subtrees on a background worker so the next run starts from the
    /// newly selected base.
    pub(crate) fn select(&self, id: &SnapshotId, confirm: Confirm) -> BoxhiveResult<OpHandle> {
        let mut store = self.store()?;
        if !store.contains(id) {
            return Err(BoxhiveError::SnapshotNotFound(id.to_string()));
        }
        self.ensure_idle("switch snapshots", confirm)?;

        let live_hive = self.layout.hive_path();
        match std::fs::remove_file(&live_hive) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(BoxhiveError::io_at("failed to remove hive", &live_hive, &e)),
        }
        let snap_hive = self.layout.snapshot_hive(id);
        if snap_hive.exists() {
            std::fs::copy(&snap_hive, &live_hive).map_err(|e| {
                BoxhiveError::io_at("failed to copy hive from snapshot", &snap_hive, &e)
            })?;
        } else {
            tracing::warn!(box_name = %self.box_name, snapshot = %id, "snapshot has no hive file");
        }

        store.set_current(Some(id));
        store.flush()?;
        tracing::info!(box_name = %self.box_name, snapshot = %id, "snapshot selected");

        let engine = self.clone();
        spawn_blocking_op(move |progress| {
            for subtree in BoxLayout::content_subtrees() {
                delete_with_progress(
                    engine.fsops.as_ref(),
                    progress,
                    &engine.layout.content_dir(subtree),
                )?;
            }
            Ok(())
        })
    }

    /// Update a snapshot's display name and/or description. `None` leaves
    /// the field as it is.
    pub(crate) fn set_info(
        &self,
        id: &SnapshotId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> BoxhiveResult<()> {
        let mut store = self.store()?;
        if !store.contains(id) {
            return Err(BoxhiveError::SnapshotNotFound(id.to_string()));
        }
        if let Some(name) = name {
            store.set_name(id, name);
        }
        if let Some(description) = description {
            store.set_description(id, description);
        }
        store.flush()
    }

    // ========================================================================
    // WORKERS
    // ========================================================================

    fn delete_snapshot_worker(&self, progress: &OpProgress, id: &SnapshotId) -> BoxhiveResult<()> {
        delete_with_progress(self.fsops.as_ref(), progress, &self.layout.snapshot_dir(id))?;

        let mut store = self.store()?;
        store.remove(id);
        store.flush()?;
        tracing::info!(box_name = %self.box_name, snapshot = %id, "snapshot deleted");
        Ok(())
    }

    /// Collapse `removed` into its single successor.
    ///
    /// `retained` is the child snapshot that survives, or `None` when the
    /// successor is the live content. The retained side acts as the merge
    /// source: its subtrees are merged into the removed snapshot's folder
    /// (retained entries win, the retained copies are consumed), then the
    /// merged folder takes over the retained identity. For the live case the
    /// merged subtrees move back to the box root; otherwise the folder is
    /// renamed to the retained snapshot's id. Pointers are rewritten to the
    /// removed snapshot's former parent before its group is dropped, and the
    /// metadata flush is the last step of all.
    fn merge_snapshot_worker(
        &self,
        progress: &OpProgress,
        removed: &SnapshotId,
        retained: Option<&SnapshotId>,
    ) -> BoxhiveResult<()> {
        let removed_dir = self.layout.snapshot_dir(removed);
        let source_root: PathBuf = match retained {
            Some(id) => self.layout.snapshot_dir(id),
            None => self.layout.root().to_path_buf(),
        };

        for subtree in BoxLayout::content_subtrees() {
            merge_with_progress(
                self.fsops.as_ref(),
                progress,
                &source_root.join(subtree),
                &self.layout.snapshot_subtree(removed, subtree),
            )?;
        }

        progress.show_message("Finishing snapshot merge...");

        match retained {
            None => {
                for subtree in BoxLayout::content_subtrees() {
                    self.fsops.rename_folder(
                        &self.layout.snapshot_subtree(removed, subtree),
                        self.layout.root(),
                        subtree,
                    )?;
                }
                self.cleanup_snapshot_dir(&removed_dir)?;
            }
            Some(retained_id) => {
                self.cleanup_snapshot_dir(&source_root)?;
                self.fsops.rename_folder(
                    &removed_dir,
                    self.layout.root(),
                    &filenames::snapshot_dir_name(retained_id),
                )?;
            }
        }

        let mut store = self.store()?;
        let former_parent = store.parent_of(removed);
        match retained {
            None => store.set_current(former_parent.as_ref()),
            Some(retained_id) => store.set_parent(retained_id, former_parent.as_ref()),
        }
        store.remove(removed);
        store.flush()?;
        tracing::info!(
            box_name = %self.box_name,
            removed = %removed,
            retained = retained.map(|id| id.to_string()).as_deref().unwrap_or("live"),
            "snapshot merged"
        );
        Ok(())
    }

    /// Drop a snapshot folder that has already been emptied of content:
    /// its hive copy first, then whatever structure remains. The folder is
    /// past its quiescence waits at this point, so none happen here.
    fn cleanup_snapshot_dir(&self, dir: &Path) -> BoxhiveResult<()> {
        let hive = dir.join(filenames::HIVE_FILE);
        match std::fs::remove_file(&hive) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(BoxhiveError::io_at(
                    "failed to remove snapshot hive",
                    &hive,
                    &e,
                ));
            }
        }
        self.fsops.delete_folder_recursive(dir)
    }
}

impl std::fmt::Debug for SnapshotEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotEngine")
            .field("box_name", &self.box_name)
            .field("root", &self.layout.root())
            .finish()
    }
}
