//! Branching snapshot history for a box.
//!
//! - [`types`]: ids, records, the forest view and the confirmation gate.
//! - [`engine`]: validation plus the folder transaction sequences for
//!   take/remove/select.

pub mod types;

pub(crate) mod engine;

pub use types::{Confirm, Snapshot, SnapshotId, SnapshotList};
