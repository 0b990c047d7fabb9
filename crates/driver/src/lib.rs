//! The batch submission control loop: polls the L2 chain head, packs new
//! blocks through the channel manager, and publishes the resulting frames to
//! L1, recovering from txpool contention and L2 reorgs along the way.

pub use config::DriverConfig;
mod config;

pub use error::DriverError;
mod error;

pub use metrics::BatchSubmitterMetrics;
mod metrics;

pub use queue::{QueueClosed, SendError, SendQueue, SendResult, TxCandidate, TxReceipt, TxRef};
mod queue;

pub use state::{TxPoolState, TxPoolStatus};
mod state;

pub use submitter::BatchSubmitter;
mod submitter;
