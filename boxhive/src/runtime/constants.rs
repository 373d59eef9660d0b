//! Constants for the boxhive runtime.
//!
//! Centralized location for environment variables, file names, settings
//! keys, and limits shared across the crate.

pub mod envs {
    /// Overrides the runtime home directory (default `~/.boxhive`).
    pub const BOXHIVE_HOME: &str = "BOXHIVE_HOME";

    /// Log filter for the tracing subscriber (EnvFilter syntax).
    pub const BOXHIVE_LOG: &str = "BOXHIVE_LOG";
}

/// On-disk file and directory naming.
pub mod filenames {
    use std::path::{Path, PathBuf};

    use crate::runtime::layout::dirs;
    use crate::snapshots::SnapshotId;

    /// Snapshot metadata document, one per box, stored under the box root.
    pub const SNAPSHOTS_FILE: &str = "Snapshots.ini";

    /// Registry hive file holding a box's virtualized registry state.
    pub const HIVE_FILE: &str = "RegHive";

    /// Runtime-wide per-box settings document, stored under the home dir.
    pub const SETTINGS_FILE: &str = "boxhive.ini";

    /// Runtime lock file name.
    pub const LOCK_FILE: &str = ".lock";

    /// Prefix for per-snapshot folders under the box root.
    pub const SNAPSHOT_DIR_PREFIX: &str = "snapshot-";

    /// Folder name for a snapshot's frozen state: `snapshot-<id>`.
    pub fn snapshot_dir_name(id: &SnapshotId) -> String {
        format!("{SNAPSHOT_DIR_PREFIX}{id}")
    }

    /// Root folder of a box: `<home>/boxes/<name>`.
    pub fn box_root(home_dir: &Path, box_name: &str) -> PathBuf {
        home_dir.join(dirs::BOXES_DIR).join(box_name)
    }
}

/// The virtualized content subtrees of a box.
pub mod content {
    /// Fixed processing order for every multi-subtree operation.
    pub const SUBTREES: [&str; 3] = ["drive", "user", "share"];
}

/// Per-box settings keys and schema defaults.
pub mod settings {
    /// Blocks `clean` while set; the delete-protection flag.
    pub const NEVER_DELETE: &str = "NeverDelete";

    /// Integer schema marker; raised on first touch to mark the box
    /// initialized.
    pub const CONFIG_LEVEL: &str = "ConfigLevel";

    pub const AUTO_RECOVER: &str = "AutoRecover";

    pub const BLOCK_NETWORK_FILES: &str = "BlockNetworkFiles";

    /// Current schema level written on first touch.
    pub const CURRENT_CONFIG_LEVEL: i64 = 7;
}

pub mod limits {
    /// Maximum box name length, enforced on open and rename.
    pub const MAX_BOX_NAME_LEN: usize = 32;
}
