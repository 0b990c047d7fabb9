use crate::QueueClosed;
use rollup_batcher_channel::ChannelError;
use rollup_batcher_codec::CodecError;
use rollup_batcher_providers::ProviderError;

/// An error occurring in the submission control loop.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// A chain data provider failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The channel manager failed.
    #[error(transparent)]
    Channel(#[from] ChannelError),
    /// Decoding an attributes transaction failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The send queue no longer accepts transactions.
    #[error(transparent)]
    QueueClosed(#[from] QueueClosed),
    /// A network call exceeded its per-call bound.
    #[error("{0} timed out")]
    Timeout(&'static str),
    /// Building a blob sidecar failed. The payload sizing is wrong, which is
    /// a programming error.
    #[error("blob sidecar construction failed: {0}")]
    Sidecar(String),
    /// An L2 block carries no transactions to derive an L1 origin from.
    #[error("block {0} has no attributes transaction")]
    MissingAttributes(u64),
    /// The first transaction of an L2 block is not a decodable attributes
    /// deposit.
    #[error("block {0} carries an undecodable attributes transaction")]
    InvalidAttributes(u64),
}

impl DriverError {
    /// Errors the loop cannot retry its way out of.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Sidecar(_) | Self::QueueClosed(_))
    }
}
