use serde::{Deserialize, Serialize};

/// Request kinds understood by the job tracker, plus the push it sends out
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestCode {
    Heartbeat = 10,
    SubmitJob = 11,
    JobFinished = 12,
    JobPull = 13,
    BizLogSend = 14,
    /// Tracker to worker delivery, never received by the dispatcher
    PushJob = 15,
}

impl RequestCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            10 => Some(RequestCode::Heartbeat),
            11 => Some(RequestCode::SubmitJob),
            12 => Some(RequestCode::JobFinished),
            13 => Some(RequestCode::JobPull),
            14 => Some(RequestCode::BizLogSend),
            15 => Some(RequestCode::PushJob),
            _ => None,
        }
    }
}

/// Response kinds
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseCode {
    Success = 0,
    SystemError = 1,
    RequestCodeNotSupported = 2,
    HeartbeatSuccess = 10,
    JobReceiveSuccess = 11,
    JobReceiveFailed = 12,
    JobFinishedSuccess = 13,
    JobPullSuccess = 14,
    BizLogSendSuccess = 15,
    JobPushSuccess = 16,
}

impl ResponseCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ResponseCode::Success),
            1 => Some(ResponseCode::SystemError),
            2 => Some(ResponseCode::RequestCodeNotSupported),
            10 => Some(ResponseCode::HeartbeatSuccess),
            11 => Some(ResponseCode::JobReceiveSuccess),
            12 => Some(ResponseCode::JobReceiveFailed),
            13 => Some(ResponseCode::JobFinishedSuccess),
            14 => Some(ResponseCode::JobPullSuccess),
            15 => Some(ResponseCode::BizLogSendSuccess),
            16 => Some(ResponseCode::JobPushSuccess),
            _ => None,
        }
    }
}

/// Role a connected process declares in its envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    JobTracker,
    TaskTracker,
    JobClient,
    Monitor,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::JobTracker => "JOB_TRACKER",
            NodeType::TaskTracker => "TASK_TRACKER",
            NodeType::JobClient => "JOB_CLIENT",
            NodeType::Monitor => "MONITOR",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "JOB_TRACKER" => Ok(NodeType::JobTracker),
            "TASK_TRACKER" => Ok(NodeType::TaskTracker),
            "JOB_CLIENT" => Ok(NodeType::JobClient),
            "MONITOR" => Ok(NodeType::Monitor),
            other => Err(format!("unknown node type '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_codes() {
        assert_eq!(RequestCode::from_code(999), None);
        assert_eq!(ResponseCode::from_code(-1), None);
        assert_eq!(RequestCode::from_code(13), Some(RequestCode::JobPull));
    }

    #[test]
    fn test_node_type_parse() {
        assert_eq!("TASK_TRACKER".parse::<NodeType>(), Ok(NodeType::TaskTracker));
        assert!("task_tracker".parse::<NodeType>().is_err());
        assert_eq!(NodeType::JobClient.to_string(), "JOB_CLIENT");
    }
}
