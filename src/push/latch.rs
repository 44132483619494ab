//! Bounded wait for a worker's answer to a push.
//!
//! The transport callback resolves a oneshot; the pushing task awaits it with a
//! deadline. Expiry and a callback that never reports both mean "not accepted".
//! Cancellation is the only hard failure.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::core::errors::{Result, TrackerError};

/// Create the sending half handed to the transport callback and the latch awaited
/// by the pusher.
pub fn acceptance_latch() -> (oneshot::Sender<bool>, oneshot::Receiver<bool>) {
    oneshot::channel()
}

/// Wait up to `wait` for the acceptance flag.
///
/// Returns `Ok(false)` on expiry or when the sender is dropped unresolved, and
/// `TrackerError::Interrupted` once `cancel` fires. An answer already delivered
/// when `cancel` fires is still honoured.
pub async fn await_acceptance(
    mut latch: oneshot::Receiver<bool>,
    wait: Duration,
    cancel: &CancellationToken,
) -> Result<bool> {
    let answer = tokio::select! {
        biased;

        _ = cancel.cancelled() => None,
        answer = tokio::time::timeout(wait, &mut latch) => Some(answer),
    };

    match answer {
        Some(Ok(Ok(accepted))) => Ok(accepted),
        Some(Ok(Err(_))) => Ok(false),
        Some(Err(_)) => {
            tracing::debug!(wait_ms = wait.as_millis() as u64, "Push latch expired");
            Ok(false)
        }
        None => match latch.try_recv() {
            Ok(accepted) => Ok(accepted),
            Err(_) => Err(TrackerError::interrupted("push latch wait")
                .with_reason("push pool cancelled")),
        },
    }
}
