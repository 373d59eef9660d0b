//! Snapshot domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::{BoxhiveError, BoxhiveResult};

/// Identifier of a snapshot: a non-empty decimal string.
///
/// Ids are allocated as the smallest positive number not already in use,
/// but hand-edited metadata may carry leading zeros; the textual form is
/// preserved verbatim so an id always matches its metadata group and its
/// on-disk folder name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SnapshotId(String);

impl SnapshotId {
    pub fn parse(raw: &str) -> BoxhiveResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BoxhiveError::Validation(format!(
                "invalid snapshot id: {raw:?}"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn from_number(n: u32) -> Self {
        Self(n.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value, when the digits fit. Free-id allocation works on this.
    pub fn as_number(&self) -> Option<u32> {
        self.0.parse().ok()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SnapshotId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for SnapshotId {
    type Err = BoxhiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// One recorded snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub name: String,
    pub description: String,
    /// When the snapshot was taken; absent for records whose date field is
    /// missing or unparseable.
    pub taken_at: Option<DateTime<Utc>>,
    /// Parent snapshot; `None` for roots.
    pub parent: Option<SnapshotId>,
}

/// A box's snapshot forest plus the current pointer.
///
/// Snapshots keep metadata order. The current pointer names the snapshot
/// the live content was last branched from; `None` means the live state has
/// no snapshot ancestry.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotList {
    snapshots: Vec<Snapshot>,
    current: Option<SnapshotId>,
}

impl SnapshotList {
    /// Assemble a listing, warning about dangling references instead of
    /// rejecting them: hand-edited metadata stays readable.
    pub(crate) fn new(snapshots: Vec<Snapshot>, current: Option<SnapshotId>) -> Self {
        let list = Self { snapshots, current };
        for snap in &list.snapshots {
            if let Some(parent) = &snap.parent
                && !list.contains(parent)
            {
                tracing::warn!(snapshot = %snap.id, parent = %parent, "snapshot references a missing parent");
            }
        }
        if let Some(current) = &list.current
            && !list.contains(current)
        {
            tracing::warn!(current = %current, "current pointer references a missing snapshot");
        }
        list
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    pub fn get(&self, id: &SnapshotId) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &SnapshotId) -> bool {
        self.get(id).is_some()
    }

    /// The snapshot the live content was last branched from.
    pub fn current(&self) -> Option<&SnapshotId> {
        self.current.as_ref()
    }

    pub fn is_current(&self, id: &SnapshotId) -> bool {
        self.current.as_ref() == Some(id)
    }

    /// Snapshots whose parent is `id`, in listing order.
    pub fn children_of(&self, id: &SnapshotId) -> Vec<&Snapshot> {
        self.snapshots
            .iter()
            .filter(|s| s.parent.as_ref() == Some(id))
            .collect()
    }

    /// Snapshots with no parent, in listing order.
    pub fn roots(&self) -> Vec<&Snapshot> {
        self.snapshots.iter().filter(|s| s.parent.is_none()).collect()
    }

    /// How many later states branch directly off `id`: child snapshots,
    /// plus the live content when the current pointer names `id`.
    pub fn successor_count(&self, id: &SnapshotId) -> usize {
        self.children_of(id).len() + usize::from(self.is_current(id))
    }
}

/// Caller's answer to the confirmation gate on destructive operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confirm {
    /// Fail with a confirmation-required error when the operation would
    /// destroy state that needs an explicit go-ahead.
    #[default]
    Require,
    /// The caller has already confirmed; proceed.
    Confirmed,
}

impl Confirm {
    pub fn is_confirmed(self) -> bool {
        matches!(self, Confirm::Confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> SnapshotId {
        SnapshotId::from_number(n)
    }

    fn snap(n: u32, parent: Option<u32>) -> Snapshot {
        Snapshot {
            id: id(n),
            name: format!("snapshot {n}"),
            description: String::new(),
            taken_at: None,
            parent: parent.map(id),
        }
    }

    #[test]
    fn test_id_parsing_accepts_digits_only() {
        assert_eq!(SnapshotId::parse("12").unwrap().as_str(), "12");
        assert_eq!(SnapshotId::parse(" 7 ").unwrap().as_str(), "7");
        assert!(SnapshotId::parse("").is_err());
        assert!(SnapshotId::parse("1a").is_err());
        assert!(SnapshotId::parse("-1").is_err());
    }

    #[test]
    fn test_id_preserves_leading_zeros() {
        let id = SnapshotId::parse("007").unwrap();
        assert_eq!(id.as_str(), "007");
        assert_eq!(id.as_number(), Some(7));
        assert_ne!(id, SnapshotId::from_number(7));
    }

    #[test]
    fn test_list_query_helpers() {
        let list = SnapshotList::new(
            vec![snap(1, None), snap(2, Some(1)), snap(3, Some(1))],
            Some(id(3)),
        );

        assert_eq!(list.len(), 3);
        assert_eq!(list.roots().len(), 1);
        assert_eq!(
            list.children_of(&id(1))
                .iter()
                .map(|s| s.id.clone())
                .collect::<Vec<_>>(),
            [id(2), id(3)]
        );
        assert!(list.is_current(&id(3)));
        assert!(!list.is_current(&id(1)));
    }

    #[test]
    fn test_successor_count_includes_live_content() {
        let list = SnapshotList::new(
            vec![snap(1, None), snap(2, Some(1))],
            Some(id(1)),
        );
        // One child plus the live branch.
        assert_eq!(list.successor_count(&id(1)), 2);
        assert_eq!(list.successor_count(&id(2)), 0);
    }

    #[test]
    fn test_no_current_means_no_live_successor() {
        let list = SnapshotList::new(vec![snap(1, None)], None);
        assert_eq!(list.current(), None);
        assert_eq!(list.successor_count(&id(1)), 0);
    }

    #[test]
    fn test_confirm_gate() {
        assert!(!Confirm::Require.is_confirmed());
        assert!(Confirm::Confirmed.is_confirmed());
        assert_eq!(Confirm::default(), Confirm::Require);
    }
}
