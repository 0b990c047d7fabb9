use crate::ProviderError;
use rollup_batcher_primitives::{L2Block, SyncStatus};

/// An instance of the trait can provide L2 chain data from the execution
/// engine.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait L2Provider: Send + Sync {
    /// Returns the L2 block at the provided height.
    async fn block_by_number(&self, number: u64) -> Result<L2Block, ProviderError>;
}

/// An instance of the trait can report the sync state of the rollup node.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait RollupProvider: Send + Sync {
    /// Returns the current sync status: L1 head, L2 safe and unsafe heads.
    async fn sync_status(&self) -> Result<SyncStatus, ProviderError>;
}
