//! Dispatch statistics.
//!
//! The push engine and the processors report through [`StatReporter`]; reporting
//! is fire-and-forget and never affects a delivery outcome.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Statistics sink
pub trait StatReporter: Send + Sync {
    /// A job was accepted by a worker
    fn inc_push_job_num(&self);

    /// A job was accepted into the executable queue
    fn inc_receive_job_num(&self);

    /// A worker reported a job as finished
    fn inc_finished_job_num(&self, success: bool);
}

/// Reporter that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStats;

impl StatReporter for NoopStats {
    fn inc_push_job_num(&self) {}
    fn inc_receive_job_num(&self) {}
    fn inc_finished_job_num(&self, _success: bool) {}
}

/// In-process counters
#[derive(Debug, Default)]
pub struct TrackerMetrics {
    pushed: AtomicU64,
    received: AtomicU64,
    finished_ok: AtomicU64,
    finished_failed: AtomicU64,
}

impl TrackerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pushed_jobs: self.pushed.load(Ordering::Relaxed),
            received_jobs: self.received.load(Ordering::Relaxed),
            finished_ok: self.finished_ok.load(Ordering::Relaxed),
            finished_failed: self.finished_failed.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.pushed.store(0, Ordering::Relaxed);
        self.received.store(0, Ordering::Relaxed);
        self.finished_ok.store(0, Ordering::Relaxed);
        self.finished_failed.store(0, Ordering::Relaxed);
    }
}

impl StatReporter for TrackerMetrics {
    fn inc_push_job_num(&self) {
        self.pushed.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_receive_job_num(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_finished_job_num(&self, success: bool) {
        if success {
            self.finished_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.finished_failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub pushed_jobs: u64,
    pub received_jobs: u64,
    pub finished_ok: u64,
    pub finished_failed: u64,
}

impl MetricsSnapshot {
    pub fn finished_jobs(&self) -> u64 {
        self.finished_ok + self.finished_failed
    }

    /// Share of finished jobs that succeeded (0.0 to 1.0)
    pub fn success_rate(&self) -> f64 {
        match self.finished_jobs() {
            0 => 0.0,
            total => self.finished_ok as f64 / total as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_counters() {
        let metrics = TrackerMetrics::new();
        metrics.inc_push_job_num();
        metrics.inc_push_job_num();
        metrics.inc_receive_job_num();
        metrics.inc_finished_job_num(true);
        metrics.inc_finished_job_num(false);
        metrics.inc_finished_job_num(true);

        let snapshot = metrics.snapshot();
        assert_eq!(
            snapshot,
            MetricsSnapshot {
                pushed_jobs: 2,
                received_jobs: 1,
                finished_ok: 2,
                finished_failed: 1,
            }
        );
        assert_eq!(snapshot.finished_jobs(), 3);
        assert!((snapshot.success_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset() {
        let metrics = TrackerMetrics::new();
        metrics.inc_push_job_num();
        metrics.reset();
        assert_eq!(metrics.snapshot().pushed_jobs, 0);
        assert_eq!(metrics.snapshot().success_rate(), 0.0);
    }
}
