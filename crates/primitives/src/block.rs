use alloy_primitives::{Bytes, B256};
use alloy_rlp::RlpEncodable;
use std::fmt::{Display, Formatter};

/// Information about a block.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
}

impl BlockInfo {
    /// Returns a new instance of [`BlockInfo`].
    pub const fn new(number: u64, hash: B256) -> Self {
        Self { number, hash }
    }
}

impl Display for BlockInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlockInfo {{ number: {}, hash: {} }}", self.number, self.hash)
    }
}

/// A reference to an L1 block.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct L1BlockRef {
    /// The block hash.
    pub hash: B256,
    /// The block number.
    pub number: u64,
    /// The parent block hash.
    pub parent_hash: B256,
    /// The block timestamp.
    pub timestamp: u64,
}

impl L1BlockRef {
    /// Returns the [`BlockInfo`] for the reference.
    pub const fn id(&self) -> BlockInfo {
        BlockInfo { number: self.number, hash: self.hash }
    }
}

impl Display for L1BlockRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "L1BlockRef {{ number: {}, hash: {} }}", self.number, self.hash)
    }
}

/// A reference to an L2 block, including its position in the L1 origin epoch.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct L2BlockRef {
    /// The block hash.
    pub hash: B256,
    /// The block number.
    pub number: u64,
    /// The parent block hash.
    pub parent_hash: B256,
    /// The block timestamp.
    pub timestamp: u64,
    /// The L1 origin the block was derived from.
    pub l1_origin: BlockInfo,
    /// The sequence number of the block within its L1 origin epoch. Resets to
    /// zero whenever the L1 origin changes.
    pub sequence_number: u64,
}

impl L2BlockRef {
    /// Returns the [`BlockInfo`] for the reference.
    pub const fn id(&self) -> BlockInfo {
        BlockInfo { number: self.number, hash: self.hash }
    }
}

/// An L2 block as loaded from the execution engine, with its transactions kept
/// as opaque EIP-2718 encoded bytes. The first transaction of every block is
/// the L1 attributes deposit.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct L2Block {
    /// The block hash.
    pub hash: B256,
    /// The block number.
    pub number: u64,
    /// The parent block hash.
    pub parent_hash: B256,
    /// The block timestamp.
    pub timestamp: u64,
    /// The EIP-2718 encoded transactions of the block.
    pub transactions: Vec<Bytes>,
}

#[derive(RlpEncodable)]
struct L2BlockPayload<'a> {
    parent_hash: &'a B256,
    number: u64,
    timestamp: u64,
    transactions: &'a Vec<Bytes>,
}

impl L2Block {
    /// Returns the [`BlockInfo`] for the block.
    pub const fn id(&self) -> BlockInfo {
        BlockInfo { number: self.number, hash: self.hash }
    }

    /// Returns the RLP payload handed to the channel compressor.
    pub fn payload_bytes(&self) -> Bytes {
        let payload = L2BlockPayload {
            parent_hash: &self.parent_hash,
            number: self.number,
            timestamp: self.timestamp,
            transactions: &self.transactions,
        };
        alloy_rlp::encode(&payload).into()
    }
}
