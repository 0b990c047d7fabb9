use alloy_primitives::B256;

/// An error occurring at the channel manager.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The added block does not extend the last block added. The submission
    /// side detects an L2 reorg through this rejection.
    #[error("block with parent {got} does not extend current tip {expected}")]
    Reorg {
        /// Hash of the last block added.
        expected: B256,
        /// Parent hash of the rejected block.
        got: B256,
    },
    /// The channel compressor failed.
    #[error("compression error: {0}")]
    Compression(#[from] std::io::Error),
    /// Channels still hold unconfirmed data after a close. The caller must
    /// keep draining instead of discarding state.
    #[error("channels have pending data after close")]
    PendingAfterClose,
}
