//! Process supervision seam.
//!
//! Snapshot operations and box cleaning must not run while programs are
//! still using the box, so the engine asks a [`ProcessMonitor`] before it
//! touches content. The monitor is a collaborator interface: embedders that
//! supervise processes themselves plug their tracker in, everyone else gets
//! [`NullProcessMonitor`], and [`TrackedProcessMonitor`] covers callers that
//! register pids by hand.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::errors::{BoxhiveError, BoxhiveResult};

pub trait ProcessMonitor: Send + Sync + 'static {
    /// Number of processes currently running inside the box.
    fn active_process_count(&self, box_name: &str) -> u32;

    fn has_active_processes(&self, box_name: &str) -> bool {
        self.active_process_count(box_name) > 0
    }

    /// Forcibly end every process in the box. Processes already gone are
    /// not an error.
    fn terminate_all(&self, box_name: &str) -> BoxhiveResult<()>;
}

/// Monitor for embedders without process supervision: every box is idle.
#[derive(Debug, Default)]
pub struct NullProcessMonitor;

impl ProcessMonitor for NullProcessMonitor {
    fn active_process_count(&self, _box_name: &str) -> u32 {
        0
    }

    fn terminate_all(&self, _box_name: &str) -> BoxhiveResult<()> {
        Ok(())
    }
}

/// Monitor over caller-registered pids.
///
/// Liveness is probed with signal 0; dead pids are pruned on every count.
/// Termination is SIGKILL, with already-gone processes tolerated.
#[derive(Debug, Default)]
pub struct TrackedProcessMonitor {
    pids: RwLock<HashMap<String, Vec<u32>>>,
}

impl TrackedProcessMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a process as running inside `box_name`.
    pub fn register(&self, box_name: &str, pid: u32) {
        self.pids
            .write()
            .entry(box_name.to_string())
            .or_default()
            .push(pid);
    }
}

impl ProcessMonitor for TrackedProcessMonitor {
    fn active_process_count(&self, box_name: &str) -> u32 {
        let mut pids = self.pids.write();
        let Some(entry) = pids.get_mut(box_name) else {
            return 0;
        };
        entry.retain(|pid| pid_is_alive(*pid));
        let count = entry.len() as u32;
        if count == 0 {
            pids.remove(box_name);
        }
        count
    }

    fn terminate_all(&self, box_name: &str) -> BoxhiveResult<()> {
        let Some(entry) = self.pids.write().remove(box_name) else {
            return Ok(());
        };
        let mut first_err = None;
        for pid in entry {
            if let Err(e) = kill_pid(pid) {
                tracing::warn!(box_name, pid, error = %e, "failed to terminate process");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(unix)]
fn pid_is_alive(pid: u32) -> bool {
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

#[cfg(not(unix))]
fn pid_is_alive(_pid: u32) -> bool {
    false
}

#[cfg(unix)]
fn kill_pid(pid: u32) -> BoxhiveResult<()> {
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGKILL) };
    if rc == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        return Ok(());
    }
    Err(BoxhiveError::io(
        format!("failed to terminate process {pid}"),
        &err,
    ))
}

#[cfg(not(unix))]
fn kill_pid(_pid: u32) -> BoxhiveResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_monitor_reports_idle() {
        let monitor = NullProcessMonitor;
        assert_eq!(monitor.active_process_count("any"), 0);
        assert!(!monitor.has_active_processes("any"));
        monitor.terminate_all("any").unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_tracked_monitor_counts_and_terminates_live_processes() {
        let monitor = TrackedProcessMonitor::new();
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        monitor.register("work", child.id());

        assert!(monitor.has_active_processes("work"));
        assert_eq!(monitor.active_process_count("work"), 1);

        monitor.terminate_all("work").unwrap();
        // Reap so the pid stops counting as alive.
        child.wait().unwrap();

        assert_eq!(monitor.active_process_count("work"), 0);
        // A second terminate has nothing left to do.
        monitor.terminate_all("work").unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_tracked_monitor_prunes_exited_processes() {
        let monitor = TrackedProcessMonitor::new();
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();

        monitor.register("work", pid);
        assert_eq!(monitor.active_process_count("work"), 0);
        assert!(!monitor.has_active_processes("work"));
    }

    #[test]
    fn test_unknown_box_is_idle() {
        let monitor = TrackedProcessMonitor::new();
        assert_eq!(monitor.active_process_count("other"), 0);
        monitor.terminate_all("other").unwrap();
    }
}
