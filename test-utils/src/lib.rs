//! Shared helpers for boxhive integration tests.
//!
//! Provides a disposable [`TestHome`] wired to a private runtime home plus
//! instrumented folder-ops and process-monitor implementations so tests can
//! observe, gate, or fail the snapshot engine's filesystem steps
//! deterministically.

mod fsops;
mod home;
mod process;

pub use fsops::{FailingFolderOps, FsCall, GatedFolderOps, RecordingFolderOps};
pub use home::{read_file, write_tree, TestHome};
pub use process::StaticProcessMonitor;

use boxhive::{OpHandle, OpStatus};

/// Drive a background operation to completion from synchronous test code.
pub fn wait_blocking(handle: &mut OpHandle) -> OpStatus {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("test runtime")
        .block_on(handle.wait())
}
