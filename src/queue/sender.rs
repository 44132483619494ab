//! Moves jobs between the executable and executing queues around a delivery.
//!
//! A job is locked in the executable queue, copied into the executing queue and
//! only then removed from the executable queue. Restoring walks the same steps
//! backwards, so at every point the job is held by at least one queue.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::queue::job::Job;
use crate::queue::{ExecutableJobQueue, ExecutingJobQueue};

/// Result of handing one job to a worker
#[derive(Debug, Clone, PartialEq)]
pub enum Checkout {
    /// Job moved to the executing queue and ready to be sent
    Ready(Job),
    /// Nothing eligible for the group
    NoJob,
    /// The job identity was already executing. The job stays locked in the
    /// executable queue until [`JobSender::release`] is called.
    Conflict(Job),
}

/// Queue hand-off used by the push engine
#[derive(Clone)]
pub struct JobSender {
    executable: Arc<dyn ExecutableJobQueue>,
    executing: Arc<dyn ExecutingJobQueue>,
}

impl JobSender {
    pub fn new(
        executable: Arc<dyn ExecutableJobQueue>,
        executing: Arc<dyn ExecutingJobQueue>,
    ) -> Self {
        Self {
            executable,
            executing,
        }
    }

    /// Take the next job of `node_group` for the worker `identity` and move it to
    /// the executing queue.
    pub fn checkout(&self, node_group: &str, identity: &str) -> Checkout {
        let Some(job) = self.executable.take(node_group, identity) else {
            return Checkout::NoJob;
        };

        if let Err(err) = self.executing.add(job.clone()) {
            warn!(
                job_id = %job.job_id,
                node_group,
                identity,
                error = %err,
                "Job already executing, holding it back"
            );
            return Checkout::Conflict(job);
        }

        self.executable.remove(&job.job_id);
        debug!(job_id = %job.job_id, node_group, identity, "Job checked out");
        Checkout::Ready(job)
    }

    /// Return an undelivered job to the executable queue.
    ///
    /// The job is re-added locked, dropped from the executing queue, then unlocked.
    /// When its identity is already queued the existing entry wins and only the
    /// executing entry is cleaned up. Returns `true` when this call re-queued the job.
    pub fn restore(&self, mut job: Job) -> bool {
        job.is_running = true;
        job.task_tracker_identity = None;
        job.touch();

        let requeued = match self.executable.add(job.clone()) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    job_id = %job.job_id,
                    node_group = %job.node_group,
                    error = %err,
                    "Job already queued, skipping resume"
                );
                false
            }
        };

        self.executing.remove(&job.job_id);

        if requeued {
            self.executable.resume(&job);
            debug!(job_id = %job.job_id, node_group = %job.node_group, "Job restored");
        }
        requeued
    }

    /// Unlock a job held back by a conflicting checkout
    pub fn release(&self, job: &Job) -> bool {
        self.executable.resume(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{MemoryExecutableQueue, MemoryExecutingQueue};
    use pretty_assertions::assert_eq;

    fn sender() -> (JobSender, Arc<MemoryExecutableQueue>, Arc<MemoryExecutingQueue>) {
        let executable = Arc::new(MemoryExecutableQueue::new());
        let executing = Arc::new(MemoryExecutingQueue::new());
        (
            JobSender::new(executable.clone(), executing.clone()),
            executable,
            executing,
        )
    }

    #[test]
    fn test_checkout_moves_job() {
        let (sender, executable, executing) = sender();
        executable.add(Job::new("t", "g").with_id("j1")).unwrap();

        let Checkout::Ready(job) = sender.checkout("g", "w1") else {
            panic!("expected a job");
        };
        assert_eq!(job.job_id, "j1");
        assert!(executable.get("j1").is_none());
        let running = executing.get("j1").unwrap();
        assert_eq!(running.task_tracker_identity.as_deref(), Some("w1"));
    }

    #[test]
    fn test_checkout_empty_group() {
        let (sender, _, _) = sender();
        assert_eq!(sender.checkout("g", "w1"), Checkout::NoJob);
    }

    #[test]
    fn test_checkout_conflict_holds_job_until_released() {
        let (sender, executable, executing) = sender();
        executable.add(Job::new("t", "g").with_id("j1")).unwrap();
        executable.add(Job::new("t", "g").with_id("j2")).unwrap();
        executing.add(Job::new("t", "g").with_id("j1")).unwrap();

        let Checkout::Conflict(held) = sender.checkout("g", "w1") else {
            panic!("expected a conflict");
        };
        assert_eq!(held.job_id, "j1");
        assert!(executable.get("j1").unwrap().is_running);

        // The next pick gets past the held job
        let Checkout::Ready(job) = sender.checkout("g", "w1") else {
            panic!("expected a job");
        };
        assert_eq!(job.job_id, "j2");

        assert!(sender.release(&held));
        assert!(!executable.get("j1").unwrap().is_running);
        assert_eq!(executable.count("g"), 1);
    }

    #[test]
    fn test_restore_requeues() {
        let (sender, executable, executing) = sender();
        executable.add(Job::new("t", "g").with_id("j1")).unwrap();
        let Checkout::Ready(job) = sender.checkout("g", "w1") else {
            panic!("expected a job");
        };

        assert!(sender.restore(job));
        assert!(executing.is_empty());
        let queued = executable.get("j1").unwrap();
        assert!(!queued.is_running);
        assert_eq!(queued.task_tracker_identity, None);
        assert_eq!(executable.count("g"), 1);
    }

    #[test]
    fn test_restore_duplicate_still_cleans_executing() {
        let (sender, executable, executing) = sender();
        executable.add(Job::new("t", "g").with_id("j1")).unwrap();
        let Checkout::Ready(job) = sender.checkout("g", "w1") else {
            panic!("expected a job");
        };
        // Re-submitted while in flight
        executable.add(Job::new("t", "g").with_id("j1").with_priority(1)).unwrap();

        assert!(!sender.restore(job));
        assert!(executing.get("j1").is_none());
        assert_eq!(executable.count("g"), 1);
        assert_eq!(executable.get("j1").unwrap().priority, 1);
    }
}
