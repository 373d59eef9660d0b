//! Configuration for the boxhive runtime.

use std::path::PathBuf;

use dirs::home_dir;

use crate::runtime::constants::envs;
use crate::runtime::layout::dirs as layout_dirs;

/// Configuration options for [`BoxhiveRuntime`](crate::runtime::BoxhiveRuntime).
///
/// Users can create it with defaults and modify fields as needed.
#[derive(Clone, Debug)]
pub struct BoxhiveOptions {
    /// Runtime home directory holding box roots, settings, and logs.
    pub home_dir: PathBuf,
}

impl Default for BoxhiveOptions {
    fn default() -> Self {
        let home_dir = std::env::var(envs::BOXHIVE_HOME)
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let mut path = home_dir().unwrap_or_else(|| PathBuf::from("."));
                path.push(layout_dirs::BOXHIVE_DIR);
                path
            });

        Self { home_dir }
    }
}

impl BoxhiveOptions {
    /// Options rooted at an explicit home directory.
    pub fn with_home(home_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_home_is_kept() {
        let options = BoxhiveOptions::with_home("/srv/hive");
        assert_eq!(options.home_dir, PathBuf::from("/srv/hive"));
    }

    #[test]
    fn test_default_home_is_not_empty() {
        // Either BOXHIVE_HOME or the ~/.boxhive fallback; both are non-empty.
        let options = BoxhiveOptions::default();
        assert!(!options.home_dir.as_os_str().is_empty());
    }
}
