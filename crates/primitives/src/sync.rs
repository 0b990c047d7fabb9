use crate::{L1BlockRef, L2BlockRef};

/// A view of the rollup node's sync progress.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    /// The current L1 head.
    pub head_l1: L1BlockRef,
    /// The L2 safe head: derived from published L1 data.
    pub safe_l2: L2BlockRef,
    /// The L2 unsafe head: the tip of the chain, not yet backed by L1 data.
    pub unsafe_l2: L2BlockRef,
}
