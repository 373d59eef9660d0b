use std::path::{Path, PathBuf};
use std::sync::Arc;

use boxhive::{
    BoxhiveOptions, BoxhiveRuntime, FolderOps, HiveBox, LocalFolderOps, NullProcessMonitor,
    ProcessMonitor,
};
use tempfile::TempDir;

/// A runtime rooted in a temporary home directory.
///
/// The home (settings, boxes, logs, lock file) lives under a [`TempDir`] and
/// disappears with the value, so every test starts from a clean slate.
pub struct TestHome {
    runtime: BoxhiveRuntime,
    _temp: TempDir,
}

impl TestHome {
    /// A home with the stock local collaborators.
    pub fn new() -> Self {
        Self::with_collaborators(Arc::new(LocalFolderOps::new()), Arc::new(NullProcessMonitor))
    }

    /// A home with instrumented collaborators injected.
    pub fn with_collaborators(
        fsops: Arc<dyn FolderOps>,
        monitor: Arc<dyn ProcessMonitor>,
    ) -> Self {
        let temp = TempDir::new().expect("create temp home");
        let options = BoxhiveOptions::with_home(temp.path().join("home"));
        let runtime = BoxhiveRuntime::with_collaborators(options, fsops, monitor)
            .expect("initialize test runtime");
        Self {
            runtime,
            _temp: temp,
        }
    }

    pub fn runtime(&self) -> &BoxhiveRuntime {
        &self.runtime
    }

    /// Open (and initialize on first use) a box, panicking on failure.
    pub fn open_box(&self, name: &str) -> HiveBox {
        self.runtime.open_box(name).expect("open box")
    }
}

impl Default for TestHome {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a set of `(relative path, contents)` files under `root`, creating
/// parent directories as needed.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path: PathBuf = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, contents).expect("write test file");
    }
}

/// Read a file to a string, panicking with the path on failure.
pub fn read_file(path: &Path) -> String {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}
