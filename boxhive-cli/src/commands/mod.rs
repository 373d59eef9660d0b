//! Subcommand implementations.

pub mod clean;
pub mod list;
pub mod remove;
pub mod remove_box;
pub mod rename;
pub mod select;
pub mod set_info;
pub mod take;

use boxhive::{Confirm, OpHandle, OpStatus};

/// Map the shared `--yes` flag onto the library's confirmation gate.
pub(crate) fn confirm_flag(yes: bool) -> Confirm {
    if yes { Confirm::Confirmed } else { Confirm::Require }
}

/// Drive a background operation to completion: stream progress messages to
/// stderr, translate Ctrl-C into a cooperative cancel request, and turn the
/// terminal status into the process exit path.
pub(crate) async fn run_op(mut handle: OpHandle) -> anyhow::Result<()> {
    let mut messages = handle.subscribe_messages();
    let printer = tokio::spawn(async move {
        while messages.changed().await.is_ok() {
            let text = messages.borrow_and_update().clone();
            if !text.is_empty() {
                eprintln!("{text}");
            }
        }
    });

    let canceller = handle.clone();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Stopping before the next destructive step...");
            canceller.request_cancel();
        }
    });

    let status = handle.wait().await;
    printer.abort();
    signal.abort();

    match status {
        OpStatus::Ok => Ok(()),
        OpStatus::Aborted => anyhow::bail!("aborted"),
        OpStatus::Failed { message, .. } => anyhow::bail!(message),
    }
}
