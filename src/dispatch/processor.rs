use std::sync::Arc;

use async_trait::async_trait;

use crate::core::errors::Result;
use crate::protocol::RemotingCommand;
use crate::remoting::Channel;

/// Handler for one request kind.
///
/// An `Err` is reported back to the caller as a `SystemError` response; it never
/// reaches the transport.
#[async_trait]
pub trait RequestProcessor: Send + Sync {
    async fn process_request(
        &self,
        channel: &Arc<dyn Channel>,
        request: RemotingCommand,
    ) -> Result<RemotingCommand>;
}
