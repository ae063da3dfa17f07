//! Lifetime run counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counts of pipeline runs since process start.
///
/// Unlike the pipeline registry these are never evicted.
#[derive(Debug, Default)]
pub struct RunCounters {
    started: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCountersSnapshot {
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RunCountersSnapshot {
        RunCountersSnapshot {
            started: self.started.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let counters = RunCounters::new();
        counters.record_started();
        counters.record_started();
        counters.record_completed();
        counters.record_failed();

        assert_eq!(
            counters.snapshot(),
            RunCountersSnapshot {
                started: 2,
                completed: 1,
                failed: 1
            }
        );
    }
}
