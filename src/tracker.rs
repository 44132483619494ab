//! Job tracker wiring: shared context, lifecycle and builder.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cluster::{CapacityTracker, NodeRegistry};
use crate::core::config::TrackerConfig;
use crate::core::errors::{Result, TrackerError};
use crate::dispatch::RemotingDispatcher;
use crate::metrics::{StatReporter, TrackerMetrics};
use crate::protocol::RemotingCommand;
use crate::push::JobPusher;
use crate::queue::{ExecutableJobQueue, ExecutingJobQueue, MemoryExecutableQueue, MemoryExecutingQueue};
use crate::remoting::{Channel, RemotingServer};

/// Components shared by the dispatcher, the processors and the push engine
pub struct AppContext {
    pub config: TrackerConfig,
    pub registry: Arc<NodeRegistry>,
    pub capacity: CapacityTracker,
    pub executable_queue: Arc<dyn ExecutableJobQueue>,
    pub executing_queue: Arc<dyn ExecutingJobQueue>,
    pub remoting: Arc<dyn RemotingServer>,
    pub stats: Arc<dyn StatReporter>,
}

/// A running job tracker
pub struct JobTracker {
    ctx: Arc<AppContext>,
    dispatcher: Arc<RemotingDispatcher>,
    pusher: JobPusher,
    cancel: CancellationToken,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl JobTracker {
    pub fn builder() -> JobTrackerBuilder {
        JobTrackerBuilder::new()
    }

    fn new(ctx: Arc<AppContext>) -> Self {
        let cancel = CancellationToken::new();
        let pusher = JobPusher::new(ctx.clone(), cancel.child_token());
        let dispatcher = Arc::new(RemotingDispatcher::new(ctx.clone(), pusher.clone()));
        Self {
            ctx,
            dispatcher,
            pusher,
            cancel,
            sweeper: Mutex::new(None),
        }
    }

    /// Start background maintenance. Must be called within a tokio runtime;
    /// repeated calls are no-ops.
    pub fn start(&self) {
        let mut sweeper = self.sweeper.lock();
        if sweeper.is_some() || self.cancel.is_cancelled() {
            return;
        }

        let registry = self.ctx.registry.clone();
        let cancel = self.cancel.clone();
        let period = self.ctx.config.channel_check_interval;

        *sweeper = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = registry.evict_closed();
                        if evicted > 0 {
                            info!(evicted, "Evicted nodes with closed connections");
                        }
                    }
                }
            }
        }));

        info!(
            node_group = %self.ctx.config.node_group,
            identity = %self.ctx.config.identity,
            push_pool_size = self.ctx.config.push_pool_size,
            "Job tracker started"
        );
    }

    /// Answer one inbound command
    pub async fn handle(&self, channel: &Arc<dyn Channel>, request: RemotingCommand) -> RemotingCommand {
        self.dispatcher.handle(channel, request).await
    }

    /// Stop the push pool and background maintenance. Pushes waiting on a worker
    /// restore their job and fail as interrupted.
    pub async fn shutdown(&self) {
        info!("Initiating shutdown");
        self.pusher.shutdown();
        self.cancel.cancel();

        let sweeper = self.sweeper.lock().take();
        if let Some(handle) = sweeper {
            let _ = handle.await;
        }
        info!("Shutdown complete");
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.ctx.config
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.ctx.registry
    }

    pub fn capacity(&self) -> &CapacityTracker {
        &self.ctx.capacity
    }

    pub fn executable_queue(&self) -> &Arc<dyn ExecutableJobQueue> {
        &self.ctx.executable_queue
    }

    pub fn executing_queue(&self) -> &Arc<dyn ExecutingJobQueue> {
        &self.ctx.executing_queue
    }

    pub fn dispatcher(&self) -> &Arc<RemotingDispatcher> {
        &self.dispatcher
    }

    pub fn pusher(&self) -> &JobPusher {
        &self.pusher
    }
}

/// Builder for JobTracker
#[derive(Default)]
pub struct JobTrackerBuilder {
    config: Option<TrackerConfig>,
    remoting: Option<Arc<dyn RemotingServer>>,
    executable_queue: Option<Arc<dyn ExecutableJobQueue>>,
    executing_queue: Option<Arc<dyn ExecutingJobQueue>>,
    stats: Option<Arc<dyn StatReporter>>,
}

impl JobTrackerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_remoting(mut self, remoting: Arc<dyn RemotingServer>) -> Self {
        self.remoting = Some(remoting);
        self
    }

    /// Replace the in-memory queues
    pub fn with_queues(
        mut self,
        executable: Arc<dyn ExecutableJobQueue>,
        executing: Arc<dyn ExecutingJobQueue>,
    ) -> Self {
        self.executable_queue = Some(executable);
        self.executing_queue = Some(executing);
        self
    }

    pub fn with_stats(mut self, stats: Arc<dyn StatReporter>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn build(self) -> Result<JobTracker> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let remoting = self
            .remoting
            .ok_or_else(|| TrackerError::configuration_field("remoting server is required", "remoting"))?;

        let registry = Arc::new(NodeRegistry::new());
        let ctx = Arc::new(AppContext {
            capacity: CapacityTracker::new(registry.clone()),
            registry,
            executable_queue: self
                .executable_queue
                .unwrap_or_else(|| Arc::new(MemoryExecutableQueue::new())),
            executing_queue: self
                .executing_queue
                .unwrap_or_else(|| Arc::new(MemoryExecutingQueue::new())),
            remoting,
            stats: self.stats.unwrap_or_else(|| Arc::new(TrackerMetrics::new())),
            config,
        });

        Ok(JobTracker::new(ctx))
    }
}
