//! Shared configuration registry: one group per box in `boxhive.ini`.
//!
//! Values are typed leniently the way hand-edited config wants: booleans
//! accept `y`/`yes`/`true`/`1`, numbers fall back to a default on junk.
//! The registry is shared across boxes, so access goes through a mutex;
//! mutations stay in memory until an explicit [`SettingsRegistry::flush`].

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::errors::{BoxhiveError, BoxhiveResult};
use crate::store::document::IniDocument;

pub struct SettingsRegistry {
    path: PathBuf,
    doc: Mutex<IniDocument>,
}

impl SettingsRegistry {
    pub fn open(path: impl Into<PathBuf>) -> BoxhiveResult<Self> {
        let path = path.into();
        let doc = IniDocument::load(&path)?;
        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_text(&self, box_name: &str, key: &str) -> Option<String> {
        self.doc.lock().get(box_name, key).map(str::to_string)
    }

    pub fn get_bool(&self, box_name: &str, key: &str, default: bool) -> bool {
        match self.get_text(box_name, key) {
            Some(raw) => parse_bool(&raw).unwrap_or(default),
            None => default,
        }
    }

    pub fn get_num(&self, box_name: &str, key: &str, default: i64) -> i64 {
        match self.get_text(box_name, key) {
            Some(raw) => raw.trim().parse().unwrap_or(default),
            None => default,
        }
    }

    pub fn set_text(&self, box_name: &str, key: &str, value: &str) {
        self.doc.lock().set(box_name, key, value);
    }

    pub fn set_bool(&self, box_name: &str, key: &str, value: bool) {
        self.set_text(box_name, key, if value { "y" } else { "n" });
    }

    pub fn set_num(&self, box_name: &str, key: &str, value: i64) {
        self.set_text(box_name, key, &value.to_string());
    }

    pub fn remove_key(&self, box_name: &str, key: &str) {
        self.doc.lock().remove_key(box_name, key);
    }

    pub fn has_box(&self, box_name: &str) -> bool {
        self.doc.lock().has_group(box_name)
    }

    /// Names of every box with a settings group, in document order.
    pub fn box_names(&self) -> Vec<String> {
        self.doc.lock().group_names()
    }

    /// Move a box's settings group to a new name, keeping its position.
    pub fn rename_box(&self, old: &str, new: &str) -> BoxhiveResult<()> {
        let mut doc = self.doc.lock();
        if doc.has_group(new) {
            return Err(BoxhiveError::Validation(format!(
                "a box named {new} already exists"
            )));
        }
        if !doc.rename_group(old, new) {
            return Err(BoxhiveError::Validation(format!("unknown box: {old}")));
        }
        Ok(())
    }

    /// Drop a box's settings group. Returns whether it existed.
    pub fn remove_box(&self, box_name: &str) -> bool {
        self.doc.lock().remove_group(box_name)
    }

    pub fn flush(&self) -> BoxhiveResult<()> {
        self.doc.lock().flush(&self.path)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Some(true),
        "n" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry_in(temp: &TempDir) -> SettingsRegistry {
        SettingsRegistry::open(temp.path().join("boxhive.ini")).unwrap()
    }

    #[test]
    fn test_typed_accessors_round_trip() {
        let temp = TempDir::new().unwrap();
        let settings = registry_in(&temp);

        settings.set_bool("work", "NeverDelete", true);
        settings.set_num("work", "ConfigLevel", 7);
        settings.set_text("work", "Note", "hello");
        settings.flush().unwrap();

        let reopened = registry_in(&temp);
        assert!(reopened.get_bool("work", "NeverDelete", false));
        assert_eq!(reopened.get_num("work", "ConfigLevel", 0), 7);
        assert_eq!(reopened.get_text("work", "Note").as_deref(), Some("hello"));

        // Stored in the short ini form.
        let text = std::fs::read_to_string(settings.path()).unwrap();
        assert!(text.contains("NeverDelete=y"));
        assert!(text.contains("ConfigLevel=7"));
    }

    #[test]
    fn test_lenient_bool_and_num_parsing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("boxhive.ini");
        std::fs::write(&path, "[b]\nA=Yes\nB=TRUE\nC=0\nD=maybe\nN=junk\n").unwrap();

        let settings = SettingsRegistry::open(&path).unwrap();
        assert!(settings.get_bool("b", "A", false));
        assert!(settings.get_bool("b", "B", false));
        assert!(!settings.get_bool("b", "C", true));
        assert!(settings.get_bool("b", "D", true));
        assert_eq!(settings.get_num("b", "N", 42), 42);
        assert_eq!(settings.get_num("b", "Missing", -1), -1);
    }

    #[test]
    fn test_rename_box_rejects_collisions_and_unknowns() {
        let temp = TempDir::new().unwrap();
        let settings = registry_in(&temp);
        settings.set_bool("alpha", "Enabled", true);
        settings.set_bool("beta", "Enabled", true);

        assert!(settings.rename_box("alpha", "beta").is_err());
        assert!(settings.rename_box("ghost", "gamma").is_err());
        settings.rename_box("alpha", "gamma").unwrap();

        assert!(!settings.has_box("alpha"));
        assert!(settings.has_box("gamma"));
        assert_eq!(settings.box_names(), ["gamma", "beta"]);
    }

    #[test]
    fn test_remove_box_reports_existence() {
        let temp = TempDir::new().unwrap();
        let settings = registry_in(&temp);
        settings.set_bool("alpha", "Enabled", true);
        assert!(settings.remove_box("alpha"));
        assert!(!settings.remove_box("alpha"));
    }
}
