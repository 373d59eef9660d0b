//! Typed view over a box's `Snapshots.ini`.
//!
//! One group per snapshot (`Snapshot_<id>`) plus a scalar `Current/Snapshot`
//! pointer. Group order in the document is preserved, so listings come back
//! in the order snapshots were recorded. Reads are tolerant: groups with
//! unparseable ids and junk field values are skipped or degraded with a
//! warning rather than failing the whole listing.
//!
//! Mutations stay in memory until [`SnapshotStore::flush`]; operations that
//! must not commit half-way stage all their field writes and flush once.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::errors::BoxhiveResult;
use crate::snapshots::{Snapshot, SnapshotId, SnapshotList};
use crate::store::document::IniDocument;

mod schema {
    pub const GROUP_PREFIX: &str = "Snapshot_";
    pub const CURRENT_GROUP: &str = "Current";
    pub const CURRENT_KEY: &str = "Snapshot";

    pub const KEY_NAME: &str = "Name";
    pub const KEY_DESCRIPTION: &str = "Description";
    pub const KEY_DATE: &str = "SnapshotDate";
    pub const KEY_PARENT: &str = "Parent";
}

pub struct SnapshotStore {
    path: PathBuf,
    doc: IniDocument,
}

impl SnapshotStore {
    pub fn open(path: impl Into<PathBuf>) -> BoxhiveResult<Self> {
        let path = path.into();
        let doc = IniDocument::load(&path)?;
        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn group_name(id: &SnapshotId) -> String {
        format!("{}{}", schema::GROUP_PREFIX, id.as_str())
    }

    /// All recorded snapshots in document order, plus the current pointer.
    pub fn list(&self) -> SnapshotList {
        let mut snapshots = Vec::new();
        for group in self.doc.group_names() {
            let Some(raw_id) = group.strip_prefix(schema::GROUP_PREFIX) else {
                continue;
            };
            let id = match SnapshotId::parse(raw_id) {
                Ok(id) => id,
                Err(_) => {
                    tracing::warn!(group = %group, "skipping snapshot group with invalid id");
                    continue;
                }
            };
            snapshots.push(Snapshot {
                name: self.text_field(&group, schema::KEY_NAME),
                description: self.text_field(&group, schema::KEY_DESCRIPTION),
                taken_at: self.date_field(&group),
                parent: self.parent_field(&group),
                id,
            });
        }
        SnapshotList::new(snapshots, self.current())
    }

    pub fn contains(&self, id: &SnapshotId) -> bool {
        self.doc.has_group(&Self::group_name(id))
    }

    pub fn parent_of(&self, id: &SnapshotId) -> Option<SnapshotId> {
        self.parent_field(&Self::group_name(id))
    }

    /// The current snapshot pointer. `None` means the live state has no
    /// snapshot ancestry (pointer absent or empty).
    pub fn current(&self) -> Option<SnapshotId> {
        let raw = self
            .doc
            .get(schema::CURRENT_GROUP, schema::CURRENT_KEY)?
            .trim();
        if raw.is_empty() {
            return None;
        }
        match SnapshotId::parse(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(value = %raw, "ignoring unparseable current snapshot pointer");
                None
            }
        }
    }

    /// Point the current marker at `id`, or clear it entirely.
    pub fn set_current(&mut self, id: Option<&SnapshotId>) {
        match id {
            Some(id) => self
                .doc
                .set(schema::CURRENT_GROUP, schema::CURRENT_KEY, id.as_str()),
            None => self.doc.remove_key(schema::CURRENT_GROUP, schema::CURRENT_KEY),
        }
    }

    /// Record a new snapshot group. Empty optional fields are left out
    /// rather than written as empty values.
    pub fn insert(&mut self, snapshot: &Snapshot) {
        let group = Self::group_name(&snapshot.id);
        self.doc.set(&group, schema::KEY_NAME, &snapshot.name);
        if !snapshot.description.is_empty() {
            self.doc
                .set(&group, schema::KEY_DESCRIPTION, &snapshot.description);
        }
        if let Some(taken_at) = snapshot.taken_at {
            self.doc.set(&group, schema::KEY_DATE, taken_at.to_rfc3339());
        }
        if let Some(parent) = &snapshot.parent {
            self.doc.set(&group, schema::KEY_PARENT, parent.as_str());
        }
    }

    pub fn set_name(&mut self, id: &SnapshotId, name: &str) {
        self.doc.set(&Self::group_name(id), schema::KEY_NAME, name);
    }

    pub fn set_description(&mut self, id: &SnapshotId, description: &str) {
        self.doc
            .set(&Self::group_name(id), schema::KEY_DESCRIPTION, description);
    }

    /// Rewrite a snapshot's parent pointer. `None` makes it a root: the key
    /// is removed, never written as an empty value.
    pub fn set_parent(&mut self, id: &SnapshotId, parent: Option<&SnapshotId>) {
        let group = Self::group_name(id);
        match parent {
            Some(parent) => self.doc.set(&group, schema::KEY_PARENT, parent.as_str()),
            None => self.doc.remove_key(&group, schema::KEY_PARENT),
        }
    }

    /// Drop a snapshot's group. Returns whether it existed.
    pub fn remove(&mut self, id: &SnapshotId) -> bool {
        self.doc.remove_group(&Self::group_name(id))
    }

    pub fn flush(&self) -> BoxhiveResult<()> {
        self.doc.flush(&self.path)
    }

    fn text_field(&self, group: &str, key: &str) -> String {
        self.doc.get(group, key).unwrap_or_default().to_string()
    }

    fn date_field(&self, group: &str) -> Option<DateTime<Utc>> {
        let raw = self.doc.get(group, schema::KEY_DATE)?;
        match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!(group = %group, value = %raw, error = %e, "ignoring unparseable snapshot date");
                None
            }
        }
    }

    fn parent_field(&self, group: &str) -> Option<SnapshotId> {
        let raw = self.doc.get(group, schema::KEY_PARENT)?.trim();
        if raw.is_empty() {
            return None;
        }
        match SnapshotId::parse(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(group = %group, value = %raw, "ignoring unparseable snapshot parent");
                None
            }
        }
    }
}
