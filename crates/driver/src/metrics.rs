use metrics::Counter;
use metrics_derive::Metrics;

/// The metrics of the batch submitter.
#[derive(Metrics, Clone)]
#[metrics(scope = "batch_submitter")]
pub struct BatchSubmitterMetrics {
    /// Number of L2 blocks loaded from the execution engine.
    pub blocks_loaded: Counter,
    /// Number of batcher transactions handed to the send queue.
    pub txs_published: Counter,
    /// Number of pool-clearing cancellation transactions sent.
    pub cancellations_sent: Counter,
    /// Number of L2 reorgs detected and recovered from.
    pub reorgs_detected: Counter,
}
