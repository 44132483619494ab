use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::clock;
use crate::protocol::{JobMeta, JobSpec};

/// Job identity, unique across all queues
pub type JobId = String;

/// A job as held by the tracker's queues
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub task_id: String,
    /// Worker pool that may run this job
    pub node_group: String,
    /// Lower runs first
    pub priority: i32,
    pub params: HashMap<String, String>,
    pub submit_node_group: Option<String>,
    /// Worker the job was last handed to
    pub task_tracker_identity: Option<String>,
    /// Locked by a pusher; not eligible for `take`
    pub is_running: bool,
    pub gmt_created: i64,
    pub gmt_modified: i64,
}

impl Job {
    pub fn new(task_id: impl Into<String>, node_group: impl Into<String>) -> Self {
        let now = clock::now_millis();
        Self {
            job_id: Uuid::new_v4().simple().to_string(),
            task_id: task_id.into(),
            node_group: node_group.into(),
            priority: 100,
            params: HashMap::new(),
            submit_node_group: None,
            task_tracker_identity: None,
            is_running: false,
            gmt_created: now,
            gmt_modified: now,
        }
    }

    /// Build a queued job from a client submission
    pub fn from_spec(spec: JobSpec, submit_node_group: Option<&str>) -> Self {
        let mut job = Self::new(spec.task_id, spec.node_group);
        job.priority = spec.priority;
        job.params = spec.params;
        job.submit_node_group = submit_node_group.map(str::to_string);
        job
    }

    pub fn with_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = job_id.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Representation sent to workers
    pub fn to_meta(&self) -> JobMeta {
        JobMeta {
            job_id: self.job_id.clone(),
            task_id: self.task_id.clone(),
            node_group: self.node_group.clone(),
            priority: self.priority,
            params: self.params.clone(),
            submit_node_group: self.submit_node_group.clone(),
        }
    }

    pub(crate) fn touch(&mut self) {
        self.gmt_modified = clock::now_millis();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_creation() {
        let job = Job::new("order-sync", "billing");
        assert!(!job.is_running);
        assert_eq!(job.node_group, "billing");
        assert_eq!(job.gmt_created, job.gmt_modified);
        assert_eq!(job.job_id.len(), 32);
    }

    #[test]
    fn test_from_spec_and_meta() {
        let spec = JobSpec::new("report", "analytics")
            .with_priority(5)
            .with_param("day", "2024-01-01");
        let job = Job::from_spec(spec, Some("client_group"));
        let meta = job.to_meta();

        assert_eq!(meta.job_id, job.job_id);
        assert_eq!(meta.priority, 5);
        assert_eq!(meta.params.get("day").map(String::as_str), Some("2024-01-01"));
        assert_eq!(meta.submit_node_group.as_deref(), Some("client_group"));
    }
}
