//! Credit-based admission control.
//!
//! Each worker owns one [`SlotCounter`]. Exactly two writers touch it: capacity
//! reports carried by pull requests (overwrite), and the push engine after an
//! accepted delivery (decrement). Reads never lock.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cluster::node::WorkerNode;
use crate::cluster::registry::NodeRegistry;

/// Available execution slots of one worker
#[derive(Debug)]
pub struct SlotCounter {
    available: AtomicI32,
    /// Timestamp of the last applied report; serialises report writers only
    reported_at: Mutex<i64>,
}

impl SlotCounter {
    pub fn new() -> Self {
        Self {
            available: AtomicI32::new(0),
            reported_at: Mutex::new(i64::MIN),
        }
    }

    /// Current number of free slots
    pub fn get(&self) -> i32 {
        self.available.load(Ordering::Acquire)
    }

    /// Overwrite with a worker report. Reports older than the last applied one are
    /// dropped and `false` is returned.
    pub fn report(&self, value: i32, timestamp: i64) -> bool {
        let mut last = self.reported_at.lock();
        if timestamp < *last {
            return false;
        }
        *last = timestamp;
        self.available.store(value.max(0), Ordering::Release);
        true
    }

    /// Take one slot if any is left; returns the remaining count, never below zero
    pub fn decrement(&self) -> i32 {
        match self
            .available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                if v > 0 {
                    Some(v - 1)
                } else {
                    None
                }
            }) {
            Ok(previous) => previous - 1,
            Err(_) => 0,
        }
    }

    /// Timestamp of the last applied report, if any
    pub fn reported_at(&self) -> Option<i64> {
        let last = *self.reported_at.lock();
        (last != i64::MIN).then_some(last)
    }
}

impl Default for SlotCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Capacity view over the registered workers
#[derive(Clone)]
pub struct CapacityTracker {
    registry: Arc<NodeRegistry>,
}

impl CapacityTracker {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self { registry }
    }

    /// Apply a reported slot count. Returns the worker, or `None` when the identity
    /// is not registered (the report is then discarded).
    pub fn update(
        &self,
        node_group: &str,
        identity: &str,
        available_threads: i32,
        timestamp: i64,
    ) -> Option<Arc<WorkerNode>> {
        let node = self.registry.lookup(node_group, identity)?;
        if !node.slots().report(available_threads, timestamp) {
            tracing::debug!(
                node_group,
                identity,
                timestamp,
                "Ignoring stale capacity report"
            );
        }
        Some(node)
    }

    pub fn decrement(&self, node_group: &str, identity: &str) -> Option<i32> {
        self.registry
            .lookup(node_group, identity)
            .map(|node| node.slots().decrement())
    }

    pub fn get(&self, node_group: &str, identity: &str) -> Option<i32> {
        self.registry
            .lookup(node_group, identity)
            .map(|node| node.slots().get())
    }
}
