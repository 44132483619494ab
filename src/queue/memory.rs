use std::collections::{BTreeMap, HashMap};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::core::errors::{Result, TrackerError};
use crate::queue::job::{Job, JobId};
use crate::queue::{ExecutableJobQueue, ExecutingJobQueue};

/// Ordering key inside a group: priority first, then insertion sequence
type OrderKey = (i32, u64);

#[derive(Debug, Default)]
struct ExecutableState {
    seq: u64,
    groups: HashMap<String, BTreeMap<OrderKey, JobId>>,
    jobs: HashMap<JobId, (OrderKey, Job)>,
}

/// In-process executable queue
#[derive(Debug, Default)]
pub struct MemoryExecutableQueue {
    state: Mutex<ExecutableState>,
}

impl MemoryExecutableQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExecutableJobQueue for MemoryExecutableQueue {
    fn add(&self, job: Job) -> Result<()> {
        let mut state = self.state.lock();
        if state.jobs.contains_key(&job.job_id) {
            return Err(TrackerError::duplicate_job("executable", job.job_id));
        }
        state.seq += 1;
        let key = (job.priority, state.seq);
        state
            .groups
            .entry(job.node_group.clone())
            .or_default()
            .insert(key, job.job_id.clone());
        state.jobs.insert(job.job_id.clone(), (key, job));
        Ok(())
    }

    fn take(&self, node_group: &str, identity: &str) -> Option<Job> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let job_id = state
            .groups
            .get(node_group)?
            .values()
            .find(|id| matches!(state.jobs.get(*id), Some((_, job)) if !job.is_running))?
            .clone();

        let (_, job) = state.jobs.get_mut(&job_id)?;
        job.is_running = true;
        job.task_tracker_identity = Some(identity.to_string());
        job.touch();
        Some(job.clone())
    }

    fn resume(&self, job: &Job) -> bool {
        let mut state = self.state.lock();
        match state.jobs.get_mut(&job.job_id) {
            Some((_, queued)) => {
                queued.is_running = false;
                queued.task_tracker_identity = None;
                queued.touch();
                true
            }
            None => false,
        }
    }

    fn remove(&self, job_id: &str) -> Option<Job> {
        let mut state = self.state.lock();
        let (key, job) = state.jobs.remove(job_id)?;
        if let Some(order) = state.groups.get_mut(&job.node_group) {
            order.remove(&key);
            if order.is_empty() {
                state.groups.remove(&job.node_group);
            }
        }
        Some(job)
    }

    fn get(&self, job_id: &str) -> Option<Job> {
        self.state.lock().jobs.get(job_id).map(|(_, job)| job.clone())
    }

    fn count(&self, node_group: &str) -> usize {
        self.state
            .lock()
            .groups
            .get(node_group)
            .map_or(0, |order| order.len())
    }
}

/// In-process executing queue
#[derive(Debug, Default)]
pub struct MemoryExecutingQueue {
    jobs: DashMap<JobId, Job>,
}

impl MemoryExecutingQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExecutingJobQueue for MemoryExecutingQueue {
    fn add(&self, job: Job) -> Result<()> {
        match self.jobs.entry(job.job_id.clone()) {
            Entry::Occupied(_) => Err(TrackerError::duplicate_job("executing", job.job_id)),
            Entry::Vacant(entry) => {
                entry.insert(job);
                Ok(())
            }
        }
    }

    fn remove(&self, job_id: &str) -> Option<Job> {
        self.jobs.remove(job_id).map(|(_, job)| job)
    }

    fn get(&self, job_id: &str) -> Option<Job> {
        self.jobs.get(job_id).map(|job| job.clone())
    }

    fn jobs_for(&self, identity: &str) -> Vec<Job> {
        self.jobs
            .iter()
            .filter(|job| job.task_tracker_identity.as_deref() == Some(identity))
            .map(|job| job.value().clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.jobs.len()
    }
}
