//! # jobtracker: job delivery core of a distributed scheduler
//!
//! Workers (task trackers) pull for work by reporting their free execution slots.
//! The job tracker routes their commands, tracks that capacity per worker and
//! pushes queued jobs to them, restoring any job a worker does not accept.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use jobtracker::{JobTracker, RemotingServer, TrackerConfig};
//!
//! # async fn run(transport: Arc<dyn RemotingServer>) -> jobtracker::Result<()> {
//! let tracker = JobTracker::builder()
//!     .with_config(TrackerConfig::default())
//!     .with_remoting(transport)
//!     .build()?;
//! tracker.start();
//! // feed inbound commands to `tracker.handle(&channel, command)`
//! tracker.shutdown().await;
//! # Ok(())
//! # }
//! ```

// Core infrastructure modules
pub mod core {
    pub mod clock;
    pub mod config;
    pub mod errors;
    pub mod telemetry;
}

pub mod cluster;   // Node registry and capacity tracking
pub mod dispatch;  // Command routing
pub mod metrics;
pub mod protocol;  // Wire-level message model
pub mod push;      // Push engine
pub mod queue;     // Job queues and hand-off
pub mod remoting;  // Delivery channel seam
pub mod tracker;

// Re-exports for convenience
pub use crate::core::config::{TrackerConfig, TrackerConfigBuilder};
pub use crate::core::errors::{Result, TrackerError};
pub use cluster::{CapacityTracker, ConnectionWrapper, NodeRegistry, SlotCounter, WorkerNode};
pub use dispatch::{RemotingDispatcher, RequestProcessor};
pub use metrics::{MetricsSnapshot, NoopStats, StatReporter, TrackerMetrics};
pub use protocol::{
    CommandBody, NodeType, Payload, RemotingCommand, RequestCode, ResponseCode,
};
pub use push::{JobPusher, PullSignal, PushOutcome};
pub use queue::{
    Checkout, ExecutableJobQueue, ExecutingJobQueue, Job, JobId, JobSender,
    MemoryExecutableQueue, MemoryExecutingQueue,
};
pub use remoting::{Channel, ChannelId, RemotingSendError, RemotingServer, ResponseCallback};
pub use tracker::{AppContext, JobTracker, JobTrackerBuilder};
