//! Processors for the non-heartbeat request kinds.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::core::errors::{Result, TrackerError};
use crate::dispatch::processor::RequestProcessor;
use crate::protocol::{Payload, RemotingCommand, ResponseCode};
use crate::push::{JobPusher, PullSignal};
use crate::queue::Job;
use crate::remoting::Channel;
use crate::tracker::AppContext;

fn unexpected_payload(kind: &str) -> TrackerError {
    TrackerError::invalid_request(format!("{} request without matching payload", kind))
}

/// Accepts submitted jobs into the executable queue
pub struct JobSubmitProcessor {
    ctx: Arc<AppContext>,
}

impl JobSubmitProcessor {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl RequestProcessor for JobSubmitProcessor {
    async fn process_request(
        &self,
        _channel: &Arc<dyn Channel>,
        request: RemotingCommand,
    ) -> Result<RemotingCommand> {
        let body = request.body()?;
        let Payload::SubmitJob(submit) = &body.payload else {
            return Err(unexpected_payload("SubmitJob"));
        };

        let mut rejected = Vec::new();
        for spec in submit.jobs.iter().cloned() {
            if spec.task_id.is_empty() || spec.node_group.is_empty() {
                warn!(task_id = %spec.task_id, "Submitted job without task id or node group");
                rejected.push(spec.task_id);
                continue;
            }

            let job = Job::from_spec(spec, body.node_group.as_deref());
            let task_id = job.task_id.clone();
            match self.ctx.executable_queue.add(job) {
                Ok(()) => self.ctx.stats.inc_receive_job_num(),
                Err(e) => {
                    warn!(task_id = %task_id, error = %e, "Submitted job rejected");
                    rejected.push(task_id);
                }
            }
        }

        if rejected.is_empty() {
            Ok(RemotingCommand::response(ResponseCode::JobReceiveSuccess, ""))
        } else {
            Ok(RemotingCommand::response(
                ResponseCode::JobReceiveFailed,
                format!("rejected tasks: {}", rejected.join(",")),
            ))
        }
    }
}

/// Takes completion reports off the executing queue
pub struct JobFinishedProcessor {
    ctx: Arc<AppContext>,
}

impl JobFinishedProcessor {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl RequestProcessor for JobFinishedProcessor {
    async fn process_request(
        &self,
        _channel: &Arc<dyn Channel>,
        request: RemotingCommand,
    ) -> Result<RemotingCommand> {
        let body = request.body()?;
        let meta = body.node_meta()?;
        let Payload::JobFinished(finished) = &body.payload else {
            return Err(unexpected_payload("JobFinished"));
        };

        for result in &finished.results {
            match self.ctx.executing_queue.remove(&result.job_id) {
                Some(_) => {
                    self.ctx.stats.inc_finished_job_num(result.success);
                    debug!(
                        job_id = %result.job_id,
                        identity = meta.identity,
                        success = result.success,
                        "Job finished"
                    );
                }
                None => warn!(
                    job_id = %result.job_id,
                    identity = meta.identity,
                    "Finished job was not executing"
                ),
            }
        }

        Ok(RemotingCommand::response(ResponseCode::JobFinishedSuccess, ""))
    }
}

/// Turns a pull request into a scheduled push; answers before any job is sent
pub struct JobPullProcessor {
    pusher: JobPusher,
}

impl JobPullProcessor {
    pub fn new(pusher: JobPusher) -> Self {
        Self { pusher }
    }
}

#[async_trait]
impl RequestProcessor for JobPullProcessor {
    async fn process_request(
        &self,
        _channel: &Arc<dyn Channel>,
        request: RemotingCommand,
    ) -> Result<RemotingCommand> {
        let body = request.body()?;
        let meta = body.node_meta()?;
        let Payload::JobPull(pull) = &body.payload else {
            return Err(unexpected_payload("JobPull"));
        };

        self.pusher.concurrent_push(PullSignal::new(
            meta.node_group,
            meta.identity,
            pull.available_threads,
            pull.timestamp,
        ));

        Ok(RemotingCommand::response(ResponseCode::JobPullSuccess, ""))
    }
}

/// Records business log lines sent by running jobs
#[derive(Default)]
pub struct BizLogProcessor;

#[async_trait]
impl RequestProcessor for BizLogProcessor {
    async fn process_request(
        &self,
        _channel: &Arc<dyn Channel>,
        request: RemotingCommand,
    ) -> Result<RemotingCommand> {
        let body = request.body()?;
        let Payload::BizLog(log) = &body.payload else {
            return Err(unexpected_payload("BizLogSend"));
        };

        info!(
            target: "jobtracker::bizlog",
            job_id = %log.job_id,
            task_id = %log.task_id,
            log_time = log.log_time,
            identity = body.identity.as_deref().unwrap_or_default(),
            "{}",
            log.msg
        );

        Ok(RemotingCommand::response(ResponseCode::BizLogSendSuccess, ""))
    }
}
