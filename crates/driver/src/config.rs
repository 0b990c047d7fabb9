use std::time::Duration;

/// Timing parameters of the submission control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Interval between control-loop ticks.
    pub poll_interval: Duration,
    /// Bound on every single network call, distinct from the lifetime
    /// signals.
    pub network_timeout: Duration,
    /// Interval between attempts to re-query the safe origin after a reorg.
    pub clear_retry_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            network_timeout: Duration::from_secs(10),
            clear_retry_interval: Duration::from_secs(5),
        }
    }
}
