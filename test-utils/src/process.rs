use std::sync::atomic::{AtomicU32, Ordering};

use boxhive::{BoxhiveResult, ProcessMonitor};

/// Monitor that reports a fixed process count for every box.
///
/// `terminate_all` drops the count to zero, mimicking a real supervisor
/// that actually kills what it reports.
#[derive(Debug, Default)]
pub struct StaticProcessMonitor {
    count: AtomicU32,
}

impl StaticProcessMonitor {
    pub fn new(count: u32) -> Self {
        Self {
            count: AtomicU32::new(count),
        }
    }

    pub fn set_count(&self, count: u32) {
        self.count.store(count, Ordering::SeqCst);
    }
}

impl ProcessMonitor for StaticProcessMonitor {
    fn active_process_count(&self, _box_name: &str) -> u32 {
        self.count.load(Ordering::SeqCst)
    }

    fn terminate_all(&self, _box_name: &str) -> BoxhiveResult<()> {
        self.count.store(0, Ordering::SeqCst);
        Ok(())
    }
}
