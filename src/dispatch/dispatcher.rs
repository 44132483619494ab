use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::cluster::NodeRegistry;
use crate::core::errors::Result;
use crate::dispatch::handlers::{
    BizLogProcessor, JobFinishedProcessor, JobPullProcessor, JobSubmitProcessor,
};
use crate::dispatch::processor::RequestProcessor;
use crate::protocol::{RemotingCommand, RequestCode, ResponseCode};
use crate::push::JobPusher;
use crate::remoting::Channel;
use crate::tracker::AppContext;

const NOT_SUPPORTED: &str = "request code not supported";

/// Routes inbound commands to the processor for their request kind.
///
/// Every command first refreshes the node registry from its envelope, so a
/// worker re-registers with whatever it sends after a reconnect.
pub struct RemotingDispatcher {
    registry: Arc<NodeRegistry>,
    processors: HashMap<RequestCode, Arc<dyn RequestProcessor>>,
}

impl RemotingDispatcher {
    pub fn new(ctx: Arc<AppContext>, pusher: JobPusher) -> Self {
        let mut processors: HashMap<RequestCode, Arc<dyn RequestProcessor>> = HashMap::new();
        processors.insert(
            RequestCode::SubmitJob,
            Arc::new(JobSubmitProcessor::new(ctx.clone())),
        );
        processors.insert(
            RequestCode::JobFinished,
            Arc::new(JobFinishedProcessor::new(ctx.clone())),
        );
        processors.insert(RequestCode::JobPull, Arc::new(JobPullProcessor::new(pusher)));
        processors.insert(RequestCode::BizLogSend, Arc::new(BizLogProcessor));

        Self {
            registry: ctx.registry.clone(),
            processors,
        }
    }

    /// Answer `request`. Never fails: processor errors become `SystemError`
    /// responses carrying the error message.
    pub async fn handle(&self, channel: &Arc<dyn Channel>, request: RemotingCommand) -> RemotingCommand {
        let opaque = request.opaque;
        let code = request.code;
        let mut response = match self.process_request(channel, request).await {
            Ok(response) => response,
            Err(e) => {
                error!(
                    code,
                    remote_addr = %channel.remote_addr(),
                    category = e.category(),
                    error = %e,
                    "Request processing failed"
                );
                RemotingCommand::response(ResponseCode::SystemError, e.to_string())
            }
        };
        response.opaque = opaque;
        response
    }

    /// Refresh the registry, then route by request kind. A malformed envelope
    /// fails every supported kind; unsupported kinds are answered as such.
    pub async fn process_request(
        &self,
        channel: &Arc<dyn Channel>,
        request: RemotingCommand,
    ) -> Result<RemotingCommand> {
        let refreshed = self.refresh(channel, &request);

        let processor = match request.request_code() {
            Some(RequestCode::Heartbeat) => {
                refreshed?;
                return Ok(RemotingCommand::response(ResponseCode::HeartbeatSuccess, ""));
            }
            Some(code) => self.processors.get(&code),
            None => None,
        };

        match processor {
            Some(processor) => {
                refreshed?;
                processor.process_request(channel, request).await
            }
            None => {
                if let Err(e) = refreshed {
                    warn!(code = request.code, error = %e, "Unsupported request with malformed envelope");
                }
                debug!(code = request.code, "Unsupported request code");
                Ok(RemotingCommand::response(
                    ResponseCode::RequestCodeNotSupported,
                    NOT_SUPPORTED,
                ))
            }
        }
    }

    /// Upsert the sender into the registry
    fn refresh(&self, channel: &Arc<dyn Channel>, request: &RemotingCommand) -> Result<()> {
        let meta = request.body().and_then(|body| body.node_meta())?;
        self.registry.upsert(channel, meta);
        Ok(())
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }
}
