//! Delivery channel seam.
//!
//! The transport itself (sockets, framing, encoding) is provided by the embedding
//! process. The dispatch core only needs a connection handle it can address and a
//! server that sends a request over it and reports the response through a callback.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::protocol::RemotingCommand;

/// Stable identifier of one live connection
pub type ChannelId = u64;

/// A live connection to a remote process
pub trait Channel: Send + Sync + fmt::Debug {
    fn id(&self) -> ChannelId;

    fn remote_addr(&self) -> String;

    /// True once the underlying connection is gone
    fn is_closed(&self) -> bool;
}

/// Invoked exactly once by the transport, with `None` when no response arrived
/// (timeout or connection loss).
pub type ResponseCallback = Box<dyn FnOnce(Option<RemotingCommand>) + Send + 'static>;

/// Raised synchronously when a send cannot even be attempted
#[derive(Debug, Clone, Error)]
#[error("send to {remote_addr} failed: {message}")]
pub struct RemotingSendError {
    pub remote_addr: String,
    pub message: String,
}

impl RemotingSendError {
    pub fn new(remote_addr: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            remote_addr: remote_addr.into(),
            message: message.into(),
        }
    }
}

/// Request/response transport used for pushing jobs to workers.
///
/// `invoke_async` must not block: it queues the request and returns. Implementations
/// run `callback` on their own I/O threads, so the callback never blocks either.
pub trait RemotingServer: Send + Sync {
    fn invoke_async(
        &self,
        channel: &Arc<dyn Channel>,
        request: RemotingCommand,
        timeout: Duration,
        callback: ResponseCallback,
    ) -> Result<(), RemotingSendError>;
}
