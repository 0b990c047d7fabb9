use rollup_batcher_codec::FRAME_OVERHEAD;

/// Conservative usable bytes of one blob under the simple sidecar coding,
/// with headroom below the exact field-element bound.
const BLOB_DATA_CAPACITY: usize = 120_200;

/// Sizing and lifetime parameters of channels and frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Maximum compressed size of a channel in bytes. A channel closes
    /// before an appended block could push it past this bound.
    pub max_channel_size: usize,
    /// Maximum data bytes per frame, sized so one frame fits the payload of
    /// a single L1 transaction.
    pub max_frame_size: usize,
    /// Maximum number of L1 blocks a channel may stay unconfirmed after its
    /// first submission before it is abandoned.
    pub max_channel_duration: u64,
    /// Maximum L1-origin span of the blocks packed into one channel.
    pub max_l1_origin_span: u64,
    /// Number of frames bundled into one transaction.
    pub target_frames_per_tx: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_channel_size: 1 << 20,
            // one frame plus its wire overhead fits a single blob.
            max_frame_size: BLOB_DATA_CAPACITY - FRAME_OVERHEAD,
            max_channel_duration: 300,
            max_l1_origin_span: 100,
            target_frames_per_tx: 1,
        }
    }
}
