//! Bounded, jitter-free retry timing for blob resolution.

use std::time::Duration;

/// Number of blob fetch attempts before a missing blob is treated as expired.
pub const MAX_BLOB_FETCH_ATTEMPTS: u32 = 3;

/// Returns the delay to wait after the given zero-based failed attempt:
/// base-3 exponential growth from 1s, capped at 9s, no jitter.
pub const fn backoff_delay(attempt: u32) -> Duration {
    let secs = match attempt {
        0 => 1,
        1 => 3,
        _ => 9,
    };
    Duration::from_secs(secs)
}

/// An injectable sleep, so retry timing is testable without real delays.
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspends the caller for the provided duration.
    async fn sleep(&self, duration: Duration);
}

/// A [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
