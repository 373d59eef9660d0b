//! High-level runtime structures.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing_appender::non_blocking::WorkerGuard;

use crate::errors::{BoxhiveError, BoxhiveResult};
use crate::fsops::{FolderOps, LocalFolderOps};
use crate::hivebox::HiveBox;
use crate::logging;
use crate::process::{NullProcessMonitor, ProcessMonitor};
use crate::runtime::constants::limits;
use crate::runtime::layout::HomeLayout;
use crate::runtime::lock::HomeLock;
use crate::runtime::options::BoxhiveOptions;
use crate::store::SettingsRegistry;

fn valid_box_name(name: &str) -> BoxhiveResult<()> {
    if name.is_empty() {
        return Err(BoxhiveError::Validation("box name cannot be empty".into()));
    }
    if name.len() > limits::MAX_BOX_NAME_LEN {
        return Err(BoxhiveError::Validation(format!(
            "the box name can not be longer than {} characters",
            limits::MAX_BOX_NAME_LEN
        )));
    }
    if !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return Err(BoxhiveError::Validation(format!(
            "invalid box name {name:?}: only letters, digits and underscores are allowed"
        )));
    }
    Ok(())
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// BoxhiveRuntime is the entry point for opening and managing boxes.
///
/// **Lock behavior**: only one `BoxhiveRuntime` can use a given
/// `BOXHIVE_HOME` directory at a time; the filesystem lock is released on
/// drop.
///
/// **Cloning**: cheaply cloneable via `Arc`; all clones share the same
/// state, including the per-name registry of open [`HiveBox`] handles.
#[derive(Clone)]
pub struct BoxhiveRuntime {
    inner: Arc<RuntimeInner>,
}

struct RuntimeInner {
    layout: HomeLayout,
    settings: Arc<SettingsRegistry>,
    /// Open box handles by name; everyone asking for a name gets the same
    /// handle.
    boxes: RwLock<HashMap<String, HiveBox>>,
    fsops: Arc<dyn FolderOps>,
    monitor: Arc<dyn ProcessMonitor>,
    _home_lock: HomeLock,
    _log_guard: Option<WorkerGuard>,
}

// ============================================================================
// RUNTIME IMPLEMENTATION
// ============================================================================

impl BoxhiveRuntime {
    /// Create a runtime with the stock collaborators: local filesystem
    /// folder operations and no process supervision.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - another runtime is already using the same home directory
    /// - filesystem initialization fails
    pub fn new(options: BoxhiveOptions) -> BoxhiveResult<Self> {
        Self::with_collaborators(
            options,
            Arc::new(LocalFolderOps::new()),
            Arc::new(NullProcessMonitor),
        )
    }

    /// Create a runtime with explicit collaborators.
    ///
    /// Embedders supply their own folder transaction layer or process
    /// monitor here; tests inject instrumented ones.
    pub fn with_collaborators(
        options: BoxhiveOptions,
        fsops: Arc<dyn FolderOps>,
        monitor: Arc<dyn ProcessMonitor>,
    ) -> BoxhiveResult<Self> {
        if !options.home_dir.is_absolute() {
            return Err(BoxhiveError::Config(format!(
                "home_dir must be an absolute path, got: {}",
                options.home_dir.display()
            )));
        }

        let layout = HomeLayout::new(options.home_dir);
        layout.prepare()?;

        let log_guard = logging::init_for(&layout);

        let home_lock = HomeLock::acquire(layout.home_dir())?;

        let settings = Arc::new(SettingsRegistry::open(layout.settings_path())?);

        let inner = Arc::new(RuntimeInner {
            layout,
            settings,
            boxes: RwLock::new(HashMap::new()),
            fsops,
            monitor,
            _home_lock: home_lock,
            _log_guard: log_guard,
        });

        tracing::debug!(home = %inner.layout.home_dir().display(), "initialized runtime");

        Ok(Self { inner })
    }

    /// Create a runtime with default options: home resolved from
    /// `BOXHIVE_HOME`, falling back to `~/.boxhive`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use boxhive::BoxhiveRuntime;
    ///
    /// let runtime = BoxhiveRuntime::with_defaults()?;
    /// # Ok::<(), boxhive::BoxhiveError>(())
    /// ```
    pub fn with_defaults() -> BoxhiveResult<Self> {
        Self::new(BoxhiveOptions::default())
    }

    /// The runtime home directory.
    pub fn home_dir(&self) -> &Path {
        self.inner.layout.home_dir()
    }

    /// Open a handle to the named box, creating its configuration on first
    /// use. Repeated opens of the same name return the same shared handle.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use boxhive::BoxhiveRuntime;
    ///
    /// let runtime = BoxhiveRuntime::with_defaults()?;
    /// let hive_box = runtime.open_box("work")?;
    /// let snapshots = hive_box.snapshots()?;
    /// # Ok::<(), boxhive::BoxhiveError>(())
    /// ```
    pub fn open_box(&self, name: &str) -> BoxhiveResult<HiveBox> {
        valid_box_name(name)?;

        {
            let boxes = self.acquire_boxes_read()?;
            if let Some(hive_box) = boxes.get(name) {
                return Ok(hive_box.clone());
            }
        }

        let mut boxes = self.acquire_boxes_write()?;
        // Another caller may have opened it while we waited for the lock.
        if let Some(hive_box) = boxes.get(name) {
            return Ok(hive_box.clone());
        }

        let hive_box = HiveBox::open(
            name,
            self.inner.layout.box_layout(name),
            Arc::clone(&self.inner.settings),
            Arc::clone(&self.inner.fsops),
            Arc::clone(&self.inner.monitor),
        )?;
        boxes.insert(name.to_string(), hive_box.clone());
        tracing::debug!(box_name = name, "opened box");
        Ok(hive_box)
    }

    /// Names of every known box: the union of configured boxes and box
    /// folders present on disk, sorted.
    pub fn list_box_names(&self) -> BoxhiveResult<Vec<String>> {
        let mut names = self.inner.settings.box_names();

        let boxes_dir = self.inner.layout.boxes_dir();
        match std::fs::read_dir(&boxes_dir) {
            Ok(entries) => {
                for entry in entries {
                    let entry = entry.map_err(|e| {
                        BoxhiveError::io_at("failed to list boxes in", &boxes_dir, &e)
                    })?;
                    let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                    if is_dir {
                        if let Some(name) = entry.file_name().to_str() {
                            names.push(name.to_string());
                        }
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(BoxhiveError::io_at("failed to list boxes in", &boxes_dir, &e)),
        }

        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Rename a box's configuration. Spaces become underscores.
    ///
    /// The box's root folder must already be gone (cleaned); on-disk
    /// content is never migrated by a rename. Returns the final name.
    pub fn rename_box(&self, old: &str, new: &str) -> BoxhiveResult<String> {
        if !self.inner.settings.has_box(old) {
            return Err(BoxhiveError::Validation(format!("unknown box: {old}")));
        }
        if self.inner.layout.box_layout(old).root().exists() {
            return Err(BoxhiveError::Validation(
                "a box must be emptied before it can be renamed".into(),
            ));
        }

        let new_name = new.trim().replace(' ', "_");
        valid_box_name(&new_name)?;
        if self.inner.settings.has_box(&new_name)
            || self.inner.layout.box_layout(&new_name).root().exists()
        {
            return Err(BoxhiveError::Validation(format!(
                "a box named {new_name} already exists"
            )));
        }

        self.inner.settings.rename_box(old, &new_name)?;
        self.inner.settings.flush()?;
        self.acquire_boxes_write()?.remove(old);
        tracing::info!(from = old, to = %new_name, "box renamed");
        Ok(new_name)
    }

    /// Remove a box's configuration. The box's root folder must already be
    /// gone (cleaned).
    pub fn remove_box(&self, name: &str) -> BoxhiveResult<()> {
        if !self.inner.settings.has_box(name) {
            return Err(BoxhiveError::Validation(format!("unknown box: {name}")));
        }
        if self.inner.layout.box_layout(name).root().exists() {
            return Err(BoxhiveError::Validation(
                "a box must be emptied before it can be deleted".into(),
            ));
        }

        self.inner.settings.remove_box(name);
        self.inner.settings.flush()?;
        self.acquire_boxes_write()?.remove(name);
        tracing::info!(box_name = name, "box removed");
        Ok(())
    }

    fn acquire_boxes_read(&self) -> BoxhiveResult<RwLockReadGuard<'_, HashMap<String, HiveBox>>> {
        self.inner
            .boxes
            .read()
            .map_err(|e| BoxhiveError::Internal(format!("box registry lock poisoned: {e}")))
    }

    fn acquire_boxes_write(&self) -> BoxhiveResult<RwLockWriteGuard<'_, HashMap<String, HiveBox>>> {
        self.inner
            .boxes
            .write()
            .map_err(|e| BoxhiveError::Internal(format!("box registry lock poisoned: {e}")))
    }
}

impl std::fmt::Debug for BoxhiveRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxhiveRuntime")
            .field("home_dir", &self.home_dir())
            .finish()
    }
}

// The runtime is shared across threads and workers.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<BoxhiveRuntime>;
};
