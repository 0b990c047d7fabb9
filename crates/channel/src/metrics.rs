use metrics::{Counter, Gauge};
use metrics_derive::Metrics;

/// The metrics of the channel manager.
#[derive(Metrics, Clone)]
#[metrics(scope = "channel_manager")]
pub struct ChannelManagerMetrics {
    /// Number of L2 blocks packed into channels.
    pub blocks_added: Counter,
    /// Number of channels opened.
    pub channels_opened: Counter,
    /// Number of channels fully confirmed on L1.
    pub channels_confirmed: Counter,
    /// Number of channels abandoned on timeout.
    pub channels_timed_out: Counter,
    /// Number of frames cut but not yet submitted.
    pub pending_frames: Gauge,
}
