use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, TrackerError};
use crate::protocol::codes::{NodeType, RequestCode, ResponseCode};

static NEXT_OPAQUE: AtomicU64 = AtomicU64::new(1);

/// A single protocol message, request or response.
///
/// `code` stays a raw integer so that kinds unknown to this build can still be
/// carried to the dispatcher and answered there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotingCommand {
    pub code: i32,
    /// Correlates a response with its request
    pub opaque: u64,
    pub remark: Option<String>,
    pub body: Option<CommandBody>,
}

impl RemotingCommand {
    /// Build a request with a fresh opaque id
    pub fn request(code: RequestCode, body: CommandBody) -> Self {
        Self {
            code: code.code(),
            opaque: NEXT_OPAQUE.fetch_add(1, Ordering::Relaxed),
            remark: None,
            body: Some(body),
        }
    }

    /// Build a body-less response
    pub fn response(code: ResponseCode, remark: impl Into<String>) -> Self {
        let remark = remark.into();
        Self {
            code: code.code(),
            opaque: 0,
            remark: if remark.is_empty() { None } else { Some(remark) },
            body: None,
        }
    }

    pub fn request_code(&self) -> Option<RequestCode> {
        RequestCode::from_code(self.code)
    }

    pub fn response_code(&self) -> Option<ResponseCode> {
        ResponseCode::from_code(self.code)
    }

    pub fn is(&self, code: ResponseCode) -> bool {
        self.code == code.code()
    }

    /// Body of a request, or an error naming the request kind
    pub fn body(&self) -> Result<&CommandBody> {
        self.body
            .as_ref()
            .ok_or_else(|| TrackerError::missing_field("body"))
    }

    /// JSON form for transports that carry commands as text frames
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(frame: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(frame)?)
    }
}

/// Envelope every request carries, plus the kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandBody {
    pub node_group: Option<String>,
    pub identity: Option<String>,
    pub node_type: Option<String>,
    pub payload: Payload,
}

/// Sender metadata resolved from an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeMeta<'a> {
    pub node_type: NodeType,
    pub node_group: &'a str,
    pub identity: &'a str,
}

impl CommandBody {
    pub fn new(node_type: NodeType, node_group: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            node_group: Some(node_group.into()),
            identity: Some(identity.into()),
            node_type: Some(node_type.as_str().to_string()),
            payload: Payload::Empty,
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Resolve the envelope; any missing or unparsable field is an invalid request
    pub fn node_meta(&self) -> Result<NodeMeta<'_>> {
        let node_group = non_empty(&self.node_group, "node_group")?;
        let identity = non_empty(&self.identity, "identity")?;
        let node_type = non_empty(&self.node_type, "node_type")?
            .parse::<NodeType>()
            .map_err(TrackerError::invalid_request)?;
        Ok(NodeMeta {
            node_type,
            node_group,
            identity,
        })
    }
}

fn non_empty<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(TrackerError::missing_field(field)),
    }
}

/// Kind-specific request content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    Empty,
    SubmitJob(JobSubmitRequest),
    JobFinished(JobFinishedRequest),
    JobPull(JobPullRequest),
    BizLog(BizLogSendRequest),
    JobPush(JobPushRequest),
}

/// Worker asks for work and reports its free execution slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPullRequest {
    pub available_threads: i32,
    /// Worker-side time of the report, epoch millis
    pub timestamp: i64,
}

/// Tracker hands one job to a worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPushRequest {
    pub job: JobMeta,
}

/// Externally visible representation of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMeta {
    pub job_id: String,
    pub task_id: String,
    pub node_group: String,
    pub priority: i32,
    pub params: HashMap<String, String>,
    pub submit_node_group: Option<String>,
}

/// Client submits jobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSubmitRequest {
    pub jobs: Vec<JobSpec>,
}

/// A job as submitted by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub task_id: String,
    /// Worker pool expected to run the job
    pub node_group: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl JobSpec {
    pub fn new(task_id: impl Into<String>, node_group: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            node_group: node_group.into(),
            priority: 100,
            params: HashMap::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Worker reports finished jobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFinishedRequest {
    pub results: Vec<JobRunResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRunResult {
    pub job_id: String,
    pub success: bool,
    pub msg: Option<String>,
    pub time: i64,
}

/// Business log line emitted by a running job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BizLogSendRequest {
    pub job_id: String,
    pub task_id: String,
    pub msg: String,
    pub log_time: i64,
}
