//! Push engine: matches worker capacity to queued jobs.

pub mod latch;
pub mod outcome;
pub mod pusher;

pub use latch::await_acceptance;
pub use outcome::{PullSignal, PushOutcome};
pub use pusher::JobPusher;
