//! Ini-backed metadata persistence.
//!
//! - [`document`]: the ordered group/field codec with atomic flushes.
//! - [`snapshots`]: the per-box snapshot records and current pointer.
//! - [`settings`]: the shared per-box configuration registry.

pub mod document;
pub mod settings;
pub mod snapshots;

pub use document::IniDocument;
pub use settings::SettingsRegistry;
pub use snapshots::SnapshotStore;
