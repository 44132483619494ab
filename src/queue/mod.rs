//! Job queues consumed by the push engine.
//!
//! A live job sits in exactly one of two queues: the executable queue (ready to
//! run) or the executing queue (handed to a worker, completion not yet reported).
//! Both are keyed by job identity and reject duplicates.

pub mod job;
pub mod memory;
pub mod sender;

pub use job::{Job, JobId};
pub use memory::{MemoryExecutableQueue, MemoryExecutingQueue};
pub use sender::{Checkout, JobSender};

use crate::core::errors::Result;

/// Jobs ready for delivery, grouped by worker node group
pub trait ExecutableJobQueue: Send + Sync {
    /// Insert a job; an identity already present yields `TrackerError::DuplicateJob`
    fn add(&self, job: Job) -> Result<()>;

    /// Lock the next eligible job of `node_group` for the worker `identity` and
    /// return a copy. The job stays queued, marked running, until removed or resumed.
    fn take(&self, node_group: &str, identity: &str) -> Option<Job>;

    /// Clear the running mark so the job can be taken again
    fn resume(&self, job: &Job) -> bool;

    fn remove(&self, job_id: &str) -> Option<Job>;

    fn get(&self, job_id: &str) -> Option<Job>;

    /// Jobs queued for one node group, locked ones included
    fn count(&self, node_group: &str) -> usize;
}

/// Jobs handed to workers and awaiting a completion report
pub trait ExecutingJobQueue: Send + Sync {
    /// Insert a job; an identity already present yields `TrackerError::DuplicateJob`
    fn add(&self, job: Job) -> Result<()>;

    fn remove(&self, job_id: &str) -> Option<Job>;

    fn get(&self, job_id: &str) -> Option<Job>;

    /// Jobs currently attributed to the worker `identity`
    fn jobs_for(&self, identity: &str) -> Vec<Job>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
