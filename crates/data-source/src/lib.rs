//! Extraction of batcher payload bytes from L1 blocks: locate the batcher's
//! transactions in a block, pull their payloads from calldata or from blob
//! sidecars, and classify failures for the derivation pipeline.

pub use error::{DerivationError, SourceError};
mod error;

pub use backoff::{backoff_delay, Sleeper, TokioSleeper, MAX_BLOB_FETCH_ATTEMPTS};
mod backoff;

pub use filter::is_valid_batch_tx;
mod filter;

pub use source::{BlobDataSource, CalldataSource, DataSource, DataSourceFactory};
mod source;

#[cfg(test)]
mod test_utils;
