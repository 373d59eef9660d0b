//! Boxhive - Box lifecycle and branching snapshot management
//!
//! Boxhive manages the on-disk state of isolated execution containers
//! ("boxes") between runs: a branching snapshot history of each box's
//! content subtrees and registry hive, plus the box lifecycle itself
//! (initialize on first use, clean, rename, remove).
//!
//! **Architecture**:
//! - [`runtime::BoxhiveRuntime`] owns a home directory (settings, logs,
//!   box roots) and hands out shared [`HiveBox`] handles.
//! - [`snapshots`] holds the tree engine: take freezes the live content,
//!   remove deletes or merges a snapshot into its single successor,
//!   select re-bases the live content onto another snapshot.
//! - [`store`] persists metadata in ordered ini documents with atomic
//!   flushes.
//! - [`fsops`] and [`process`] are the collaborator seams: folder
//!   transactions and process supervision are injected, so embedders can
//!   supply their own and tests can instrument them.
//! - Destructive folder work runs on background workers reporting through
//!   [`progress::OpHandle`]: messages, cooperative cancel, one terminal
//!   status.

pub mod errors;
pub mod fsops;
pub mod hivebox;
pub mod process;
pub mod progress;
pub mod runtime;
pub mod snapshots;
pub mod store;

mod logging;

pub use errors::{BoxhiveError, BoxhiveResult};
pub use fsops::{FolderOps, LocalFolderOps};
pub use hivebox::HiveBox;
pub use process::{NullProcessMonitor, ProcessMonitor, TrackedProcessMonitor};
pub use progress::{OpHandle, OpProgress, OpStatus};
pub use runtime::BoxhiveRuntime;
pub use runtime::options::BoxhiveOptions;
pub use snapshots::{Confirm, Snapshot, SnapshotId, SnapshotList};
