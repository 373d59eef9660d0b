//! A handle to one box.
//!
//! [`HiveBox`] is the per-box facade over the snapshot engine, the settings
//! registry and the lifecycle operations. Handles are cheap to clone and
//! share one inner state; the runtime keeps a registry of them so every
//! caller sees the same box.

pub(crate) mod lifecycle;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::errors::BoxhiveResult;
use crate::fsops::FolderOps;
use crate::process::ProcessMonitor;
use crate::progress::OpHandle;
use crate::runtime::layout::BoxLayout;
use crate::snapshots::engine::SnapshotEngine;
use crate::snapshots::{Confirm, SnapshotId, SnapshotList};
use crate::store::SettingsRegistry;

pub(crate) struct BoxInner {
    pub(crate) name: String,
    pub(crate) layout: BoxLayout,
    pub(crate) settings: Arc<SettingsRegistry>,
    pub(crate) fsops: Arc<dyn FolderOps>,
    pub(crate) monitor: Arc<dyn ProcessMonitor>,
    /// Informational cache of the last observed process count. The monitor
    /// stays authoritative.
    pub(crate) active_count: AtomicU32,
}

#[derive(Clone)]
pub struct HiveBox {
    inner: Arc<BoxInner>,
}

impl HiveBox {
    /// Open a box handle, initializing its configuration on first use.
    pub(crate) fn open(
        name: impl Into<String>,
        layout: BoxLayout,
        settings: Arc<SettingsRegistry>,
        fsops: Arc<dyn FolderOps>,
        monitor: Arc<dyn ProcessMonitor>,
    ) -> BoxhiveResult<Self> {
        let name = name.into();
        lifecycle::initialize(&name, &settings)?;
        Ok(Self {
            inner: Arc::new(BoxInner {
                name,
                layout,
                settings,
                fsops,
                monitor,
                active_count: AtomicU32::new(0),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The box's on-disk root. May not exist yet for a box that never ran.
    pub fn root(&self) -> &Path {
        self.inner.layout.root()
    }

    fn engine(&self) -> SnapshotEngine {
        SnapshotEngine::new(
            self.inner.name.clone(),
            self.inner.layout.clone(),
            Arc::clone(&self.inner.fsops),
            Arc::clone(&self.inner.monitor),
        )
    }

    // ========================================================================
    // SNAPSHOTS
    // ========================================================================

    /// All snapshots plus the current pointer.
    pub fn snapshots(&self) -> BoxhiveResult<SnapshotList> {
        self.engine().list()
    }

    /// Freeze the live content into a new snapshot. Synchronous; see
    /// the engine docs for the partial-failure contract.
    pub fn take_snapshot(&self, name: &str, confirm: Confirm) -> BoxhiveResult<SnapshotId> {
        self.engine().take(name, confirm)
    }

    /// Remove a snapshot (deleting or merging as the tree dictates). The
    /// folder work runs in the background; track it through the handle.
    pub fn remove_snapshot(&self, id: &SnapshotId, confirm: Confirm) -> BoxhiveResult<OpHandle> {
        self.engine().remove(id, confirm)
    }

    /// Make `id` the base of the live content. The stale live subtrees are
    /// wiped in the background; track it through the handle.
    pub fn select_snapshot(&self, id: &SnapshotId, confirm: Confirm) -> BoxhiveResult<OpHandle> {
        self.engine().select(id, confirm)
    }

    /// Update a snapshot's display name and/or description.
    pub fn set_snapshot_info(
        &self,
        id: &SnapshotId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> BoxhiveResult<()> {
        self.engine().set_info(id, name, description)
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Wipe all of the box's on-disk content in the background.
    pub fn clean(&self, confirm: Confirm) -> BoxhiveResult<OpHandle> {
        lifecycle::clean(&self.inner, confirm)
    }

    /// Whether the delete-protection flag blocks [`HiveBox::clean`].
    pub fn is_delete_protected(&self) -> bool {
        self.inner.settings.get_bool(
            &self.inner.name,
            crate::runtime::constants::settings::NEVER_DELETE,
            false,
        )
    }

    pub fn set_delete_protected(&self, protected: bool) -> BoxhiveResult<()> {
        self.inner.settings.set_bool(
            &self.inner.name,
            crate::runtime::constants::settings::NEVER_DELETE,
            protected,
        );
        self.inner.settings.flush()
    }

    // ========================================================================
    // PROCESSES
    // ========================================================================

    /// Query the monitor for the current process count, refreshing the
    /// cached value.
    pub fn process_count(&self) -> u32 {
        let count = self.inner.monitor.active_process_count(&self.inner.name);
        self.inner.active_count.store(count, Ordering::SeqCst);
        count
    }

    /// Last observed process count without consulting the monitor.
    pub fn cached_process_count(&self) -> u32 {
        self.inner.active_count.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for HiveBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HiveBox")
            .field("name", &self.inner.name)
            .field("root", &self.root())
            .finish()
    }
}

// Handles are shared across threads and workers.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<HiveBox>;
};
