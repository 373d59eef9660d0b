use std::path::{Path, PathBuf};

use boxhive::{BoxhiveError, BoxhiveResult, FolderOps, LocalFolderOps};
use parking_lot::{Condvar, Mutex};

/// One observed folder operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsCall {
    Wait(PathBuf),
    Delete(PathBuf),
    Rename {
        src: PathBuf,
        dest_parent: PathBuf,
        dest_name: String,
    },
    Merge {
        source: PathBuf,
        target: PathBuf,
    },
}

/// Records every call in order before delegating to [`LocalFolderOps`].
///
/// Tests use the recorded sequence to assert step ordering, for example
/// that a merge waits on its source before its target.
#[derive(Default)]
pub struct RecordingFolderOps {
    inner: LocalFolderOps,
    calls: Mutex<Vec<FsCall>>,
}

impl RecordingFolderOps {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls observed so far, oldest first.
    pub fn calls(&self) -> Vec<FsCall> {
        self.calls.lock().clone()
    }

    /// Just the paths passed to `wait_for_folder`, oldest first.
    pub fn waited_paths(&self) -> Vec<PathBuf> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                FsCall::Wait(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }
}

impl FolderOps for RecordingFolderOps {
    fn wait_for_folder(&self, path: &Path) -> BoxhiveResult<()> {
        self.calls.lock().push(FsCall::Wait(path.to_path_buf()));
        self.inner.wait_for_folder(path)
    }

    fn delete_folder_recursive(&self, path: &Path) -> BoxhiveResult<()> {
        self.calls.lock().push(FsCall::Delete(path.to_path_buf()));
        self.inner.delete_folder_recursive(path)
    }

    fn rename_folder(
        &self,
        src: &Path,
        dest_parent: &Path,
        dest_name: &str,
    ) -> BoxhiveResult<()> {
        self.calls.lock().push(FsCall::Rename {
            src: src.to_path_buf(),
            dest_parent: dest_parent.to_path_buf(),
            dest_name: dest_name.to_string(),
        });
        self.inner.rename_folder(src, dest_parent, dest_name)
    }

    fn merge_folder(&self, source: &Path, target: &Path) -> BoxhiveResult<()> {
        self.calls.lock().push(FsCall::Merge {
            source: source.to_path_buf(),
            target: target.to_path_buf(),
        });
        self.inner.merge_folder(source, target)
    }
}

/// Traps the first `wait_for_folder` call at a gate until released.
///
/// Lets a test park a background worker right before its destructive step,
/// request cancellation, then release the gate and observe the abort:
///
/// 1. worker calls `wait_for_folder` and blocks at the gate;
/// 2. test returns from [`GatedFolderOps::wait_for_entry`], requests cancel;
/// 3. test calls [`GatedFolderOps::release`]; the worker resumes and hits
///    the cancellation checkpoint before touching anything.
pub struct GatedFolderOps {
    inner: LocalFolderOps,
    state: Mutex<GateState>,
    cond: Condvar,
}

struct GateState {
    entered: usize,
    released: bool,
}

impl GatedFolderOps {
    pub fn new() -> Self {
        Self {
            inner: LocalFolderOps::new(),
            state: Mutex::new(GateState {
                entered: 0,
                released: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Block the test thread until a worker reaches the gate.
    pub fn wait_for_entry(&self) {
        let mut state = self.state.lock();
        while state.entered == 0 {
            self.cond.wait(&mut state);
        }
    }

    /// Open the gate permanently; parked and future waits pass through.
    pub fn release(&self) {
        let mut state = self.state.lock();
        state.released = true;
        self.cond.notify_all();
    }
}

impl Default for GatedFolderOps {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderOps for GatedFolderOps {
    fn wait_for_folder(&self, path: &Path) -> BoxhiveResult<()> {
        {
            let mut state = self.state.lock();
            state.entered += 1;
            self.cond.notify_all();
            while !state.released {
                self.cond.wait(&mut state);
            }
        }
        self.inner.wait_for_folder(path)
    }

    fn delete_folder_recursive(&self, path: &Path) -> BoxhiveResult<()> {
        self.inner.delete_folder_recursive(path)
    }

    fn rename_folder(
        &self,
        src: &Path,
        dest_parent: &Path,
        dest_name: &str,
    ) -> BoxhiveResult<()> {
        self.inner.rename_folder(src, dest_parent, dest_name)
    }

    fn merge_folder(&self, source: &Path, target: &Path) -> BoxhiveResult<()> {
        self.inner.merge_folder(source, target)
    }
}

/// Fails any merge that touches the named path component, delegating
/// everything else to [`LocalFolderOps`].
pub struct FailingFolderOps {
    inner: LocalFolderOps,
    fail_component: PathBuf,
}

impl FailingFolderOps {
    /// Fail merges whose source or target ends with `component`.
    pub fn failing_on(component: impl Into<PathBuf>) -> Self {
        Self {
            inner: LocalFolderOps::new(),
            fail_component: component.into(),
        }
    }
}

impl FolderOps for FailingFolderOps {
    fn wait_for_folder(&self, path: &Path) -> BoxhiveResult<()> {
        self.inner.wait_for_folder(path)
    }

    fn delete_folder_recursive(&self, path: &Path) -> BoxhiveResult<()> {
        self.inner.delete_folder_recursive(path)
    }

    fn rename_folder(
        &self,
        src: &Path,
        dest_parent: &Path,
        dest_name: &str,
    ) -> BoxhiveResult<()> {
        self.inner.rename_folder(src, dest_parent, dest_name)
    }

    fn merge_folder(&self, source: &Path, target: &Path) -> BoxhiveResult<()> {
        if source.ends_with(&self.fail_component) || target.ends_with(&self.fail_component) {
            return Err(BoxhiveError::storage(format!(
                "injected merge failure at {}",
                self.fail_component.display()
            )));
        }
        self.inner.merge_folder(source, target)
    }
}
