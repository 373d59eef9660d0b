//! Ordered ini-style document codec.
//!
//! The metadata contract is an ordered document of named groups, each group
//! holding string fields. Group order and field order are preserved across
//! load/flush cycles, and flushes are durable (temp file + atomic rename),
//! so a crash mid-write never leaves a truncated document behind.
//!
//! The codec is deliberately hand-rolled: the consumers depend on stable
//! group ordering and tolerance for duplicate keys in hand-edited files,
//! neither of which a map-backed serializer preserves.

use std::io::Write;
use std::path::Path;

use crate::errors::{BoxhiveError, BoxhiveResult};

#[derive(Debug, Clone, Default)]
struct IniGroup {
    name: String,
    entries: Vec<(String, String)>,
}

/// An ordered ini document: `[Group]` headers followed by `Key=Value` lines.
#[derive(Debug, Clone, Default)]
pub struct IniDocument {
    groups: Vec<IniGroup>,
}

impl IniDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a document from disk. A missing file is an empty document, not
    /// an error.
    pub fn load(path: &Path) -> BoxhiveResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(BoxhiveError::io_at("failed to read document", path, &e)),
        }
    }

    /// Parse document text. Malformed lines are skipped with a warning;
    /// a document is never rejected wholesale.
    pub fn parse(text: &str) -> Self {
        let mut doc = Self::new();
        let mut current: Option<usize> = None;

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
                let name = name.trim();
                current = Some(doc.ensure_group(name));
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                tracing::warn!(line = %line, "skipping malformed ini line");
                continue;
            };
            match current {
                Some(idx) => doc.groups[idx]
                    .entries
                    .push((key.trim().to_string(), value.trim().to_string())),
                None => {
                    tracing::warn!(line = %line, "skipping ini entry outside any group");
                }
            }
        }
        doc
    }

    /// Serialize to document text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push('[');
            out.push_str(&group.name);
            out.push_str("]\n");
            for (key, value) in &group.entries {
                out.push_str(key);
                out.push('=');
                out.push_str(value);
                out.push('\n');
            }
        }
        out
    }

    /// Durably write the document to `path`: rendered into a sibling temp
    /// file, synced, then atomically renamed over the destination.
    pub fn flush(&self, path: &Path) -> BoxhiveResult<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)
            .map_err(|e| BoxhiveError::io_at("failed to create document dir", parent, &e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| BoxhiveError::io_at("failed to create temp file in", parent, &e))?;
        tmp.write_all(self.render().as_bytes())
            .map_err(|e| BoxhiveError::io_at("failed to write document", path, &e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| BoxhiveError::io_at("failed to sync document", path, &e))?;
        tmp.persist(path)
            .map_err(|e| BoxhiveError::io_at("failed to persist document", path, &e.error))?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// All group names, in document order.
    pub fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.name.clone()).collect()
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g.name == group)
    }

    /// First value for `key` in `group`, if any.
    pub fn get(&self, group: &str, key: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.name == group)?
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set `key` in `group`, creating the group at the end of the document
    /// when missing. Replaces the first occurrence and drops any duplicates.
    pub fn set(&mut self, group: &str, key: &str, value: impl Into<String>) {
        let idx = self.ensure_group(group);
        let entries = &mut self.groups[idx].entries;
        let value = value.into();
        let mut replaced = false;
        entries.retain_mut(|(k, v)| {
            if k == key {
                if replaced {
                    return false;
                }
                *v = value.clone();
                replaced = true;
            }
            true
        });
        if !replaced {
            entries.push((key.to_string(), value));
        }
    }

    /// Remove every occurrence of `key` from `group`.
    pub fn remove_key(&mut self, group: &str, key: &str) {
        if let Some(g) = self.groups.iter_mut().find(|g| g.name == group) {
            g.entries.retain(|(k, _)| k != key);
        }
    }

    /// Remove a whole group. Returns whether it existed.
    pub fn remove_group(&mut self, group: &str) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.name != group);
        self.groups.len() != before
    }

    /// Rename a group in place, keeping its position and entries.
    /// Returns false when the group does not exist.
    pub fn rename_group(&mut self, old: &str, new: &str) -> bool {
        match self.groups.iter_mut().find(|g| g.name == old) {
            Some(g) => {
                g.name = new.to_string();
                true
            }
            None => false,
        }
    }

    fn ensure_group(&mut self, name: &str) -> usize {
        if let Some(idx) = self.groups.iter().position(|g| g.name == name) {
            return idx;
        }
        self.groups.push(IniGroup {
            name: name.to_string(),
            entries: Vec::new(),
        });
        self.groups.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
[Snapshot_1]
Name=before upgrade
SnapshotDate=2026-08-20T10:00:00+00:00

[Snapshot_2]
Name=after upgrade
Parent=1

[Current]
Snapshot=2
";

    #[test]
    fn test_parse_preserves_group_order() {
        let doc = IniDocument::parse(SAMPLE);
        assert_eq!(doc.group_names(), ["Snapshot_1", "Snapshot_2", "Current"]);
        assert_eq!(doc.get("Snapshot_2", "Parent"), Some("1"));
        assert_eq!(doc.get("Current", "Snapshot"), Some("2"));
        assert_eq!(doc.get("Snapshot_1", "Parent"), None);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let doc = IniDocument::load(&temp.path().join("nope.ini")).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let doc = IniDocument::parse(
            "orphan=1\n; comment\n# also comment\n[G]\nok=yes\nnot a pair\n",
        );
        assert_eq!(doc.group_names(), ["G"]);
        assert_eq!(doc.get("G", "ok"), Some("yes"));
    }

    #[test]
    fn test_set_replaces_and_deduplicates() {
        let mut doc = IniDocument::parse("[G]\nk=1\nother=x\nk=2\n");
        // Duplicate keys: reads see the first.
        assert_eq!(doc.get("G", "k"), Some("1"));
        doc.set("G", "k", "3");
        let rendered = doc.render();
        assert_eq!(rendered.matches("k=").count(), 1);
        assert_eq!(doc.get("G", "k"), Some("3"));
        // Untouched keys keep their position.
        assert_eq!(doc.get("G", "other"), Some("x"));
    }

    #[test]
    fn test_set_creates_group_at_end() {
        let mut doc = IniDocument::parse("[A]\nx=1\n");
        doc.set("B", "y", "2");
        assert_eq!(doc.group_names(), ["A", "B"]);
    }

    #[test]
    fn test_remove_key_and_group() {
        let mut doc = IniDocument::parse(SAMPLE);
        doc.remove_key("Snapshot_2", "Parent");
        assert_eq!(doc.get("Snapshot_2", "Parent"), None);
        assert!(doc.remove_group("Snapshot_1"));
        assert!(!doc.remove_group("Snapshot_1"));
        assert_eq!(doc.group_names(), ["Snapshot_2", "Current"]);
    }

    #[test]
    fn test_rename_group_keeps_position_and_entries() {
        let mut doc = IniDocument::parse(SAMPLE);
        assert!(doc.rename_group("Snapshot_1", "Snapshot_9"));
        assert_eq!(doc.group_names(), ["Snapshot_9", "Snapshot_2", "Current"]);
        assert_eq!(doc.get("Snapshot_9", "Name"), Some("before upgrade"));
        assert!(!doc.rename_group("Snapshot_1", "Snapshot_10"));
    }

    #[test]
    fn test_flush_and_reload_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Snapshots.ini");

        let doc = IniDocument::parse(SAMPLE);
        doc.flush(&path).unwrap();

        let reloaded = IniDocument::load(&path).unwrap();
        assert_eq!(reloaded.group_names(), doc.group_names());
        assert_eq!(reloaded.render(), doc.render());
    }

    #[test]
    fn test_flush_leaves_no_temp_files_behind() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.ini");
        IniDocument::parse("[G]\nk=v\n").flush(&path).unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, ["doc.ini"]);
    }

    #[test]
    fn test_flush_creates_missing_parent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("deep").join("doc.ini");
        IniDocument::parse("[G]\nk=v\n").flush(&path).unwrap();
        assert!(path.is_file());
    }
}
