//! Command dispatcher and per-kind request processors.

pub mod dispatcher;
pub mod handlers;
pub mod processor;

pub use dispatcher::RemotingDispatcher;
pub use handlers::{BizLogProcessor, JobFinishedProcessor, JobPullProcessor, JobSubmitProcessor};
pub use processor::RequestProcessor;
