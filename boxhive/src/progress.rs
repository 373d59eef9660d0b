//! Progress/cancellation channel shared between a background worker and its
//! caller.
//!
//! Destructive folder operations (clean, delete-snapshot, merge-snapshot,
//! the select-snapshot wipe) run on blocking workers and report back through
//! this channel instead of returning errors across the async boundary:
//!
//! - the worker side ([`OpProgress`]) publishes human-readable progress
//!   messages, polls the cooperative cancel flag at checkpoints, and posts
//!   exactly one terminal [`OpStatus`];
//! - the caller side ([`OpHandle`]) requests cancellation, observes the
//!   latest message, and awaits the terminal status.
//!
//! Both sides share the same reference-counted state; dropping either side
//! never blocks the other, and a worker that dies without reporting is
//! surfaced as a failure rather than a hang.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::watch;

use crate::errors::{BoxhiveError, BoxhiveResult};

// ============================================================================
// TERMINAL STATUS
// ============================================================================

/// Terminal outcome of a background operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpStatus {
    /// The operation completed fully.
    Ok,
    /// The operation failed; `code` is the OS error code when known.
    /// Steps completed before the failure are not rolled back.
    Failed {
        message: String,
        code: Option<i32>,
    },
    /// Cancellation was requested and observed before a destructive step.
    /// Steps completed before the checkpoint are not rolled back.
    Aborted,
}

impl OpStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, OpStatus::Ok)
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, OpStatus::Aborted)
    }

    /// Map a worker error into the terminal status, keeping cancellation
    /// distinguishable from ordinary failure.
    pub fn from_error(err: &BoxhiveError) -> Self {
        if err.is_aborted() {
            OpStatus::Aborted
        } else {
            OpStatus::Failed {
                message: err.to_string(),
                code: err.os_error_code(),
            }
        }
    }

    /// Convert back into a `Result`, for callers that propagate with `?`.
    pub fn into_result(self) -> BoxhiveResult<()> {
        match self {
            OpStatus::Ok => Ok(()),
            OpStatus::Aborted => Err(BoxhiveError::Aborted),
            OpStatus::Failed { message, code } => Err(BoxhiveError::Storage { message, code }),
        }
    }
}

impl std::fmt::Display for OpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpStatus::Ok => write!(f, "completed"),
            OpStatus::Failed { message, .. } => write!(f, "failed: {message}"),
            OpStatus::Aborted => write!(f, "aborted"),
        }
    }
}

// ============================================================================
// CHANNEL
// ============================================================================

/// Create a connected progress channel.
///
/// The [`OpProgress`] half moves into the worker; the [`OpHandle`] half is
/// returned to the caller.
pub fn channel() -> (OpProgress, OpHandle) {
    let cancel = Arc::new(AtomicBool::new(false));
    let (message_tx, message_rx) = watch::channel(String::new());
    let (status_tx, status_rx) = watch::channel(None);

    let progress = OpProgress {
        cancel: Arc::clone(&cancel),
        message_tx,
        status_tx,
    };
    let handle = OpHandle {
        cancel,
        message_rx,
        status_rx,
    };
    (progress, handle)
}

/// Worker-side half of the channel.
///
/// Holds the only senders: when every `OpProgress` clone is gone, waiting
/// callers observe the channel as closed.
#[derive(Clone)]
pub struct OpProgress {
    cancel: Arc<AtomicBool>,
    message_tx: watch::Sender<String>,
    status_tx: watch::Sender<Option<OpStatus>>,
}

impl OpProgress {
    /// Publish a progress message, replacing the previous one.
    pub fn show_message(&self, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!("{text}");
        let _ = self.message_tx.send_replace(text);
    }

    /// Whether the caller has requested cancellation.
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Checkpoint helper: error out with [`BoxhiveError::Aborted`] when
    /// cancellation has been requested.
    pub fn check_cancelled(&self) -> BoxhiveResult<()> {
        if self.is_cancel_requested() {
            Err(BoxhiveError::Aborted)
        } else {
            Ok(())
        }
    }

    /// Post the terminal status. The first call wins; later calls are
    /// ignored so a cleanup path cannot overwrite the real outcome.
    pub fn finish(&self, status: OpStatus) {
        self.status_tx.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(status);
                true
            } else {
                false
            }
        });
    }
}

impl std::fmt::Debug for OpProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpProgress")
            .field("cancel_requested", &self.is_cancel_requested())
            .finish()
    }
}

/// Caller-side half of the channel.
#[derive(Clone)]
pub struct OpHandle {
    cancel: Arc<AtomicBool>,
    message_rx: watch::Receiver<String>,
    status_rx: watch::Receiver<Option<OpStatus>>,
}

impl OpHandle {
    /// Request cooperative cancellation. The worker observes the flag at its
    /// next checkpoint; a destructive step already underway is not
    /// interrupted.
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Latest progress message (empty until the worker publishes one).
    pub fn latest_message(&self) -> String {
        self.message_rx.borrow().clone()
    }

    /// Subscribe to progress messages.
    pub fn subscribe_messages(&self) -> watch::Receiver<String> {
        self.message_rx.clone()
    }

    /// Terminal status if the operation already finished, without blocking.
    pub fn status(&self) -> Option<OpStatus> {
        self.status_rx.borrow().clone()
    }

    /// Await the terminal status.
    ///
    /// Resolves to `Failed` if the worker went away without reporting.
    pub async fn wait(&mut self) -> OpStatus {
        match self.status_rx.wait_for(|status| status.is_some()).await {
            Ok(status) => match status.as_ref() {
                Some(status) => status.clone(),
                None => OpStatus::Failed {
                    message: "operation worker reported no status".into(),
                    code: None,
                },
            },
            Err(_) => OpStatus::Failed {
                message: "operation worker exited without reporting a status".into(),
                code: None,
            },
        }
    }
}

impl std::fmt::Debug for OpHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpHandle")
            .field("status", &self.status())
            .finish()
    }
}

// ============================================================================
// WORKER SPAWNING
// ============================================================================

/// Fallback runtime for callers that hold no tokio context of their own.
static WORKER_RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();

fn blocking_handle() -> BoxhiveResult<tokio::runtime::Handle> {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        return Ok(handle);
    }
    if let Some(runtime) = WORKER_RUNTIME.get() {
        return Ok(runtime.handle().clone());
    }
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("boxhive-worker")
        .build()
        .map_err(|e| BoxhiveError::Internal(format!("failed to start worker runtime: {e}")))?;
    // A racing initializer may win; use whichever runtime is stored.
    let _ = WORKER_RUNTIME.set(runtime);
    match WORKER_RUNTIME.get() {
        Some(runtime) => Ok(runtime.handle().clone()),
        None => Err(BoxhiveError::Internal(
            "worker runtime unavailable".into(),
        )),
    }
}

/// Run a blocking operation body on a worker task, wiring its result into
/// the channel's terminal status.
pub(crate) fn spawn_blocking_op<F>(op: F) -> BoxhiveResult<OpHandle>
where
    F: FnOnce(&OpProgress) -> BoxhiveResult<()> + Send + 'static,
{
    let (progress, handle) = channel();
    let runtime = blocking_handle()?;
    runtime.spawn_blocking(move || {
        let status = match op(&progress) {
            Ok(()) => OpStatus::Ok,
            Err(err) => OpStatus::from_error(&err),
        };
        progress.finish(status);
    });
    Ok(handle)
}

// Both halves cross thread boundaries.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<OpProgress>;
    let _ = assert_send_sync::<OpHandle>;
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_is_shared() {
        let (progress, handle) = channel();
        assert!(!progress.is_cancel_requested());
        handle.request_cancel();
        assert!(progress.is_cancel_requested());
        assert!(progress.check_cancelled().is_err());
    }

    #[test]
    fn test_first_finish_wins() {
        let (progress, handle) = channel();
        progress.finish(OpStatus::Ok);
        progress.finish(OpStatus::Aborted);
        assert_eq!(handle.status(), Some(OpStatus::Ok));
    }

    #[test]
    fn test_messages_replace_previous() {
        let (progress, handle) = channel();
        assert_eq!(handle.latest_message(), "");
        progress.show_message("Waiting for folder: /tmp/a");
        progress.show_message("Deleting folder: /tmp/a");
        assert_eq!(handle.latest_message(), "Deleting folder: /tmp/a");
    }

    #[tokio::test]
    async fn test_wait_returns_terminal_status() {
        let (progress, mut handle) = channel();
        progress.finish(OpStatus::Aborted);
        assert_eq!(handle.wait().await, OpStatus::Aborted);
        // Idempotent after completion.
        assert_eq!(handle.wait().await, OpStatus::Aborted);
    }

    #[tokio::test]
    async fn test_dropped_worker_surfaces_as_failure() {
        let (progress, mut handle) = channel();
        drop(progress);
        let status = handle.wait().await;
        assert!(matches!(status, OpStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn test_spawned_op_reports_through_channel() {
        let mut handle = spawn_blocking_op(|progress| {
            progress.show_message("working");
            Ok(())
        })
        .unwrap();
        assert_eq!(handle.wait().await, OpStatus::Ok);
    }

    #[tokio::test]
    async fn test_spawned_op_maps_errors_to_status() {
        let mut handle =
            spawn_blocking_op(|_| Err(BoxhiveError::storage("disk on fire"))).unwrap();
        match handle.wait().await {
            OpStatus::Failed { message, .. } => assert!(message.contains("disk on fire")),
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn test_status_round_trips_to_result() {
        assert!(OpStatus::Ok.into_result().is_ok());
        assert!(OpStatus::Aborted.into_result().is_err_and(|e| e.is_aborted()));
        let failed = OpStatus::Failed {
            message: "boom".into(),
            code: Some(5),
        };
        let err = failed.into_result().unwrap_err();
        assert_eq!(err.os_error_code(), Some(5));
    }
}
