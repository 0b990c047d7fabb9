//! Packing of pending L2 blocks into compressed channels and size-bounded
//! frames, and the bookkeeping that decides what to submit or resend next.

pub use error::ChannelError;
mod error;

pub use compress::{Compressor, CompressorFactory, ZstdCompressor, ZstdCompressorFactory};
mod compress;

pub use config::ChannelConfig;
mod config;

mod channel;

pub use manager::{ChannelManager, TxData, TxId};
mod manager;

pub use metrics::ChannelManagerMetrics;
mod metrics;
