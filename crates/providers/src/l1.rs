use crate::{BlobProviderError, ProviderError};
use alloy_consensus::TxEnvelope;
use alloy_eips::eip4844::Blob;
use alloy_primitives::B256;
use rollup_batcher_primitives::{IndexedBlobHash, L1BlockRef};

/// An instance of the trait can provide L1 chain data.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait L1Provider: Send + Sync {
    /// Returns a reference to the latest L1 block.
    async fn latest_head(&self) -> Result<L1BlockRef, ProviderError>;

    /// Returns the transactions of the L1 block with the provided hash, in
    /// block order.
    async fn transactions_by_hash(&self, block_hash: B256)
        -> Result<Vec<TxEnvelope>, ProviderError>;
}

/// An instance of the trait can fetch the blobs confirmed in an L1 block.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait BlobProvider: Send + Sync {
    /// Returns the blobs confirmed in the referenced L1 block for the
    /// provided indexed versioned hashes, in request order.
    async fn blobs(
        &self,
        block_ref: &L1BlockRef,
        hashes: &[IndexedBlobHash],
    ) -> Result<Vec<Box<Blob>>, BlobProviderError>;
}
