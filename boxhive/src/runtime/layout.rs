//! Filesystem layout for the runtime home and for individual boxes.

use std::path::{Path, PathBuf};

use crate::errors::{BoxhiveError, BoxhiveResult};
use crate::runtime::constants::{content, filenames};
use crate::snapshots::SnapshotId;

/// Directory structure constants
pub mod dirs {
    /// Base directory name for boxhive data
    pub const BOXHIVE_DIR: &str = ".boxhive";

    /// Subdirectory holding one root folder per box
    pub const BOXES_DIR: &str = "boxes";

    /// Subdirectory for log files
    pub const LOGS_DIR: &str = "logs";
}

// ============================================================================
// HOME LAYOUT (runtime home directory)
// ============================================================================

/// Layout of the runtime home directory.
///
/// ```text
/// ~/.boxhive/
/// ├── boxes/
/// │   └── {name}/         # one BoxLayout root per box
/// ├── logs/               # rolling log output
/// ├── boxhive.ini         # per-box settings, one group per box
/// └── .lock               # runtime lock
/// ```
#[derive(Clone, Debug)]
pub struct HomeLayout {
    home_dir: PathBuf,
}

impl HomeLayout {
    pub fn new(home_dir: PathBuf) -> Self {
        Self { home_dir }
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    /// Root directory for all box roots: `<home>/boxes`
    pub fn boxes_dir(&self) -> PathBuf {
        self.home_dir.join(dirs::BOXES_DIR)
    }

    /// Log output directory: `<home>/logs`
    pub fn logs_dir(&self) -> PathBuf {
        self.home_dir.join(dirs::LOGS_DIR)
    }

    /// Per-box settings document: `<home>/boxhive.ini`
    pub fn settings_path(&self) -> PathBuf {
        self.home_dir.join(filenames::SETTINGS_FILE)
    }

    /// Layout for one box under this home.
    pub fn box_layout(&self, box_name: &str) -> BoxLayout {
        BoxLayout::new(filenames::box_root(&self.home_dir, box_name))
    }

    /// Initialize the filesystem structure.
    ///
    /// Creates the home, boxes, and logs directories. Box roots themselves
    /// materialize lazily, on the first operation that writes into them.
    pub fn prepare(&self) -> BoxhiveResult<()> {
        std::fs::create_dir_all(&self.home_dir)
            .map_err(|e| BoxhiveError::io_at("failed to create home", &self.home_dir, &e))?;

        let boxes = self.boxes_dir();
        std::fs::create_dir_all(&boxes)
            .map_err(|e| BoxhiveError::io_at("failed to create boxes dir", &boxes, &e))?;

        let logs = self.logs_dir();
        std::fs::create_dir_all(&logs)
            .map_err(|e| BoxhiveError::io_at("failed to create logs dir", &logs, &e))?;

        Ok(())
    }
}

// ============================================================================
// BOX LAYOUT (per-box directory)
// ============================================================================

/// Filesystem layout for a single box root.
///
/// The live (mutable) state sits directly under the root; every snapshot
/// freezes a copy of it under its own `snapshot-<id>` folder.
///
/// # Directory Structure
///
/// ```text
/// ~/.boxhive/boxes/{name}/
/// ├── drive/              # live virtualized subtrees
/// ├── user/
/// ├── share/
/// ├── RegHive             # live registry hive
/// ├── Snapshots.ini       # snapshot metadata document
/// └── snapshot-{id}/      # frozen state, one folder per snapshot
///     ├── drive/
///     ├── user/
///     ├── share/
///     └── RegHive
/// ```
#[derive(Clone, Debug)]
pub struct BoxLayout {
    box_dir: PathBuf,
}

impl BoxLayout {
    pub fn new(box_dir: PathBuf) -> Self {
        Self { box_dir }
    }

    /// The box root folder.
    pub fn root(&self) -> &Path {
        &self.box_dir
    }

    /// The fixed subtree processing order: drive, user, share.
    pub fn content_subtrees() -> [&'static str; 3] {
        content::SUBTREES
    }

    /// A live content subtree under the box root.
    pub fn content_dir(&self, subtree: &str) -> PathBuf {
        self.box_dir.join(subtree)
    }

    /// Live registry hive: `<root>/RegHive`
    pub fn hive_path(&self) -> PathBuf {
        self.box_dir.join(filenames::HIVE_FILE)
    }

    /// Snapshot metadata document: `<root>/Snapshots.ini`
    pub fn snapshots_path(&self) -> PathBuf {
        self.box_dir.join(filenames::SNAPSHOTS_FILE)
    }

    /// Frozen-state folder of one snapshot: `<root>/snapshot-<id>`
    pub fn snapshot_dir(&self, id: &SnapshotId) -> PathBuf {
        self.box_dir.join(filenames::snapshot_dir_name(id))
    }

    /// A content subtree inside a snapshot folder.
    pub fn snapshot_subtree(&self, id: &SnapshotId, subtree: &str) -> PathBuf {
        self.snapshot_dir(id).join(subtree)
    }

    /// The hive copy inside a snapshot folder.
    pub fn snapshot_hive(&self, id: &SnapshotId) -> PathBuf {
        self.snapshot_dir(id).join(filenames::HIVE_FILE)
    }
}
