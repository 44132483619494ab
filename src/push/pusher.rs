use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cluster::WorkerNode;
use crate::core::errors::{Result, TrackerError};
use crate::protocol::{
    CommandBody, JobPushRequest, NodeType, Payload, RemotingCommand, RequestCode, ResponseCode,
};
use crate::push::latch;
use crate::push::outcome::{PullSignal, PushOutcome};
use crate::queue::{Checkout, Job, JobSender};
use crate::remoting::ResponseCallback;
use crate::tracker::AppContext;

/// Drains the executable queue into workers that announce free capacity.
///
/// Pull signals run on a bounded pool of tokio tasks; within one signal the
/// deliveries are strictly sequential.
#[derive(Clone)]
pub struct JobPusher {
    ctx: Arc<AppContext>,
    sender: JobSender,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl JobPusher {
    pub fn new(ctx: Arc<AppContext>, cancel: CancellationToken) -> Self {
        let sender = JobSender::new(ctx.executable_queue.clone(), ctx.executing_queue.clone());
        let permits = Arc::new(Semaphore::new(ctx.config.push_pool_size));
        Self {
            ctx,
            sender,
            permits,
            cancel,
        }
    }

    /// Schedule a push for `signal` on the push pool and return immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn concurrent_push(&self, signal: PullSignal) -> JoinHandle<()> {
        let pusher = self.clone();
        tokio::spawn(async move {
            let _permit = tokio::select! {
                biased;
                _ = pusher.cancel.cancelled() => return,
                permit = pusher.permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return,
                },
            };

            if let Err(e) = pusher.push(&signal).await {
                error!(
                    node_group = %signal.node_group,
                    identity = %signal.identity,
                    error = %e,
                    "Job push failed"
                );
            }
        })
    }

    /// Deliver jobs to the signalling worker until its capacity, the queue or the
    /// connection runs out. Each pull is allowed at most as many attempts as the
    /// capacity tracked when the loop starts.
    pub async fn push(&self, signal: &PullSignal) -> Result<()> {
        let Some(node) = self.ctx.capacity.update(
            &signal.node_group,
            &signal.identity,
            signal.available_threads,
            signal.timestamp,
        ) else {
            let err = TrackerError::unknown_node(&signal.node_group, &signal.identity);
            debug!(error = %err, "Pull signal ignored");
            return Ok(());
        };

        // Conflicting jobs stay locked for the rest of this pull so later
        // attempts reach the jobs queued behind them
        let mut held = Vec::new();
        let result = self.drain(&node, &mut held).await;
        for job in &held {
            self.sender.release(job);
        }
        result
    }

    async fn drain(&self, node: &WorkerNode, held: &mut Vec<Job>) -> Result<()> {
        let mut available = node.available_threads();
        let budget = available;
        let mut attempts = 0;

        while available > 0 && attempts < budget {
            attempts += 1;
            match self.attempt(node, held).await? {
                PushOutcome::Success => {
                    available = node.slots().decrement();
                    self.ctx.stats.inc_push_job_num();
                }
                PushOutcome::Failed => {
                    available = node.available_threads();
                }
                outcome @ (PushOutcome::NoJob | PushOutcome::SentError) => {
                    debug!(
                        node_group = node.node_group(),
                        identity = node.identity(),
                        %outcome,
                        attempts,
                        "Push loop stopped"
                    );
                    break;
                }
            }
        }
        Ok(())
    }

    /// One delivery attempt against `node`.
    ///
    /// Every job taken here ends up either accepted by the worker or back in the
    /// executable queue, including when the wait is interrupted.
    pub async fn send(&self, node: &WorkerNode) -> Result<PushOutcome> {
        let mut held = Vec::new();
        let outcome = self.attempt(node, &mut held).await;
        for job in &held {
            self.sender.release(job);
        }
        outcome
    }

    async fn attempt(&self, node: &WorkerNode, held: &mut Vec<Job>) -> Result<PushOutcome> {
        let job = match self.sender.checkout(node.node_group(), node.identity()) {
            Checkout::Ready(job) => job,
            Checkout::NoJob => return Ok(PushOutcome::NoJob),
            Checkout::Conflict(job) => {
                held.push(job);
                return Ok(PushOutcome::Failed);
            }
        };

        let config = &self.ctx.config;
        let request = RemotingCommand::request(
            RequestCode::PushJob,
            CommandBody::new(NodeType::JobTracker, &config.node_group, &config.identity)
                .with_payload(Payload::JobPush(JobPushRequest { job: job.to_meta() })),
        );

        let (tx, rx) = latch::acceptance_latch();
        let callback: ResponseCallback = Box::new(move |response| {
            let accepted = response.map_or(false, |r| r.is(ResponseCode::JobPushSuccess));
            let _ = tx.send(accepted);
        });

        let channel = node.channel();
        if let Err(e) =
            self.ctx
                .remoting
                .invoke_async(&channel, request, config.invoke_timeout, callback)
        {
            error!(
                job_id = %job.job_id,
                identity = node.identity(),
                error = %e,
                "Job push send failed"
            );
            self.sender.restore(job);
            return Ok(PushOutcome::SentError);
        }

        match latch::await_acceptance(rx, config.push_latch_timeout, &self.cancel).await {
            Ok(true) => {
                debug!(job_id = %job.job_id, identity = node.identity(), "Job pushed");
                Ok(PushOutcome::Success)
            }
            Ok(false) => {
                warn!(
                    job_id = %job.job_id,
                    identity = node.identity(),
                    "Job push not accepted, restoring"
                );
                self.sender.restore(job);
                Ok(PushOutcome::SentError)
            }
            Err(e) => {
                self.sender.restore(job);
                Err(e)
            }
        }
    }

    /// Cancel in-flight waits and refuse new pull signals
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            info!("Job pusher shutting down");
        }
        self.cancel.cancel();
        self.permits.close();
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
