//! Box initialization and teardown.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::errors::{BoxhiveError, BoxhiveResult};
use crate::fsops::delete_with_progress;
use crate::hivebox::BoxInner;
use crate::progress::{OpHandle, spawn_blocking_op};
use crate::runtime::constants::settings;
use crate::snapshots::Confirm;
use crate::store::SettingsRegistry;

/// Bring a box's configuration up to the current level on first touch.
///
/// The level marker only ever moves up. Boxes at the current level are left
/// alone; anything older gets the missing defaults seeded without
/// overwriting keys the user already set, then the marker is raised.
pub(crate) fn initialize(name: &str, registry: &SettingsRegistry) -> BoxhiveResult<()> {
    let level = registry.get_num(name, settings::CONFIG_LEVEL, 0);
    if level >= settings::CURRENT_CONFIG_LEVEL {
        return Ok(());
    }

    if registry.get_text(name, settings::AUTO_RECOVER).is_none() {
        registry.set_bool(name, settings::AUTO_RECOVER, false);
    }
    if registry.get_text(name, settings::BLOCK_NETWORK_FILES).is_none() {
        registry.set_bool(name, settings::BLOCK_NETWORK_FILES, true);
    }
    registry.set_num(name, settings::CONFIG_LEVEL, settings::CURRENT_CONFIG_LEVEL);
    registry.flush()?;

    tracing::info!(
        box_name = name,
        from_level = level,
        to_level = settings::CURRENT_CONFIG_LEVEL,
        "box configuration initialized"
    );
    Ok(())
}

/// Wipe all of a box's on-disk content.
///
/// Refused outright while delete protection is set. When processes are
/// still running, the caller must confirm; confirmation terminates them
/// before the wipe starts. The deletion itself runs on a background worker
/// under the usual wait/cancel/delete protocol.
pub(crate) fn clean(inner: &Arc<BoxInner>, confirm: Confirm) -> BoxhiveResult<OpHandle> {
    if inner
        .settings
        .get_bool(&inner.name, settings::NEVER_DELETE, false)
    {
        return Err(BoxhiveError::Validation(format!(
            "delete protection is enabled for box {}",
            inner.name
        )));
    }

    if inner.monitor.has_active_processes(&inner.name) && !confirm.is_confirmed() {
        return Err(BoxhiveError::ConfirmationRequired(format!(
            "processes are still running in box {}; confirm to terminate them and clean",
            inner.name
        )));
    }
    inner.monitor.terminate_all(&inner.name)?;
    inner.active_count.store(0, Ordering::SeqCst);

    let inner = Arc::clone(inner);
    spawn_blocking_op(move |progress| {
        delete_with_progress(inner.fsops.as_ref(), progress, inner.layout.root())?;
        tracing::info!(box_name = %inner.name, "box content cleaned");
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry_in(temp: &TempDir) -> SettingsRegistry {
        SettingsRegistry::open(temp.path().join("boxhive.ini")).unwrap()
    }

    #[test]
    fn test_initialize_seeds_defaults_and_raises_level() {
        let temp = TempDir::new().unwrap();
        let registry = registry_in(&temp);

        initialize("work", &registry).unwrap();

        assert_eq!(
            registry.get_num("work", settings::CONFIG_LEVEL, 0),
            settings::CURRENT_CONFIG_LEVEL
        );
        assert!(!registry.get_bool("work", settings::AUTO_RECOVER, true));
        assert!(registry.get_bool("work", settings::BLOCK_NETWORK_FILES, false));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let registry = registry_in(&temp);

        initialize("work", &registry).unwrap();
        registry.set_bool("work", settings::AUTO_RECOVER, true);
        initialize("work", &registry).unwrap();

        // Second pass is a no-op at the current level.
        assert!(registry.get_bool("work", settings::AUTO_RECOVER, false));
    }

    #[test]
    fn test_initialize_keeps_user_overrides_on_upgrade() {
        let temp = TempDir::new().unwrap();
        let registry = registry_in(&temp);
        // An old box with an explicit user setting and a stale level.
        registry.set_bool("work", settings::AUTO_RECOVER, true);
        registry.set_num("work", settings::CONFIG_LEVEL, 1);

        initialize("work", &registry).unwrap();

        assert!(registry.get_bool("work", settings::AUTO_RECOVER, false));
        assert_eq!(
            registry.get_num("work", settings::CONFIG_LEVEL, 0),
            settings::CURRENT_CONFIG_LEVEL
        );
    }
}
