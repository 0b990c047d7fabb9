use alloy_primitives::B256;

/// A blob hash with its index in the block's blob sidecar space.
///
/// The index counts blobs across every transaction of the L1 block, not only
/// across batcher transactions, so it can be matched against beacon sidecars.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct IndexedBlobHash {
    /// The index of the blob in the block.
    pub index: u64,
    /// The versioned hash of the blob.
    pub hash: B256,
}
