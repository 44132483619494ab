use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal state of a single delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PushOutcome {
    /// The worker accepted the job
    Success,
    /// No hand-off happened but the worker may still take another job
    Failed,
    /// Nothing eligible for the worker's group
    NoJob,
    /// The connection failed or the worker did not accept; the job was restored
    SentError,
}

impl PushOutcome {
    /// Whether the push loop should stop after this outcome
    pub fn ends_loop(self) -> bool {
        matches!(self, PushOutcome::NoJob | PushOutcome::SentError)
    }
}

impl fmt::Display for PushOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PushOutcome::Success => "SUCCESS",
            PushOutcome::Failed => "FAILED",
            PushOutcome::NoJob => "NO_JOB",
            PushOutcome::SentError => "SENT_ERROR",
        };
        f.write_str(name)
    }
}

/// Capacity report carried by a worker's pull request, consumed once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullSignal {
    pub node_group: String,
    pub identity: String,
    pub available_threads: i32,
    pub timestamp: i64,
}

impl PullSignal {
    pub fn new(
        node_group: impl Into<String>,
        identity: impl Into<String>,
        available_threads: i32,
        timestamp: i64,
    ) -> Self {
        Self {
            node_group: node_group.into(),
            identity: identity.into(),
            available_threads,
            timestamp,
        }
    }
}
