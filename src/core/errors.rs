use thiserror::Error;

use crate::remoting::RemotingSendError;

/// Unified error type for the job tracker dispatch core
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Request envelope or payload could not be interpreted
    #[error("Invalid request: {message}")]
    InvalidRequest {
        message: String,
        field: Option<String>,
    },

    /// A job with the same identity is already held by the queue
    #[error("Duplicate job in {queue} queue: {job_id}")]
    DuplicateJob { queue: String, job_id: String },

    /// No worker registered under the given identity
    #[error("Unknown node: {node_group}/{identity}")]
    UnknownNode { node_group: String, identity: String },

    /// Delivery channel could not even attempt the send
    #[error("Remoting send failed: {0}")]
    SendFailed(#[from] RemotingSendError),

    /// A bounded wait was cancelled before it expired
    #[error("Operation was interrupted: {operation}")]
    Interrupted {
        operation: String,
        reason: Option<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// IO errors
    #[error("IO operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization errors
    #[error("Serialization failed: {format}")]
    Serialization {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TrackerError {
    /// Create an invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid request error naming the missing field
    pub fn missing_field<F: Into<String>>(field: F) -> Self {
        let field = field.into();
        Self::InvalidRequest {
            message: format!("missing field '{}'", field),
            field: Some(field),
        }
    }

    /// Create a duplicate job error
    pub fn duplicate_job<Q: Into<String>, J: Into<String>>(queue: Q, job_id: J) -> Self {
        Self::DuplicateJob {
            queue: queue.into(),
            job_id: job_id.into(),
        }
    }

    /// Create an unknown node error
    pub fn unknown_node<G: Into<String>, I: Into<String>>(node_group: G, identity: I) -> Self {
        Self::UnknownNode {
            node_group: node_group.into(),
            identity: identity.into(),
        }
    }

    /// Create an interruption error
    pub fn interrupted<S: Into<String>>(operation: S) -> Self {
        Self::Interrupted {
            operation: operation.into(),
            reason: None,
        }
    }

    /// Attach a reason to an interruption error
    pub fn with_reason<R: Into<String>>(mut self, why: R) -> Self {
        if let Self::Interrupted { ref mut reason, .. } = self {
            *reason = Some(why.into());
        }
        self
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            field: None,
        }
    }

    /// Create a configuration error with field
    pub fn configuration_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Configuration {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an IO error
    pub fn io<S: Into<String>>(operation: S, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        format: S,
        source: E,
    ) -> Self {
        Self::Serialization {
            format: format.into(),
            source: Box::new(source),
        }
    }

    /// True for the identity conflict raised by queue inserts
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateJob { .. })
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::SendFailed(_) | Self::Io { .. } => true,
            Self::DuplicateJob { .. } | Self::UnknownNode { .. } => true,
            Self::InvalidRequest { .. } | Self::Configuration { .. } => false,
            Self::Interrupted { .. } => false,
            _ => false,
        }
    }

    /// Get error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "request",
            Self::DuplicateJob { .. } => "duplicate",
            Self::UnknownNode { .. } => "node",
            Self::SendFailed(_) => "remoting",
            Self::Interrupted { .. } => "interrupted",
            Self::Configuration { .. } => "configuration",
            Self::Io { .. } => "io",
            Self::Serialization { .. } => "serialization",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TrackerError>;

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        Self::io("io_operation", err)
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("json", err)
    }
}

impl From<serde_yaml::Error> for TrackerError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization("yaml", err)
    }
}
