use alloy_eips::eip4844::BlobTransactionSidecar;
use alloy_primitives::{Address, Bytes};
use rollup_batcher_channel::TxId;
use rollup_batcher_primitives::BlockInfo;
use tokio::sync::mpsc;

/// An L1 transaction to submit: calldata or blob carried, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxCandidate {
    /// The destination address.
    pub to: Address,
    /// The calldata payload. Empty for blob transactions.
    pub data: Bytes,
    /// The blob sidecar, present only for blob transactions.
    pub sidecar: Option<BlobTransactionSidecar>,
}

impl TxCandidate {
    /// Whether the candidate carries its payload in blobs.
    pub const fn is_blob(&self) -> bool {
        self.sidecar.is_some()
    }
}

/// Identifies a submission through its receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxRef {
    /// The channel-manager id of the payload, absent for pool-clearing
    /// cancellations.
    pub id: Option<TxId>,
    /// Whether this is a pool-clearing cancellation.
    pub is_cancel: bool,
    /// Whether the transaction carries blobs.
    pub is_blob: bool,
}

/// The outcome of a submission.
#[derive(Debug, Clone)]
pub enum SendResult {
    /// The transaction landed in the given L1 block.
    Confirmed(BlockInfo),
    /// The transaction was not included.
    Failed(SendError),
}

/// Why a submission failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SendError {
    /// The sender's txpool slot is occupied by a transaction of a different
    /// payload type.
    #[error("sender slot reserved by a different transaction type")]
    AddressReserved,
    /// Any other send or inclusion failure.
    #[error("send failed: {0}")]
    Other(String),
}

/// A receipt delivered by the send queue.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    /// The submission the receipt belongs to.
    pub tx: TxRef,
    /// The outcome.
    pub result: SendResult,
}

/// The queue rejected a send because it is shut down.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("send queue closed")]
pub struct QueueClosed;

/// A bounded-concurrency L1 transaction sender.
///
/// `send` blocks while the queue is at its in-flight capacity; that
/// backpressure is the only rate limit the control loop relies on. Every
/// accepted send eventually produces exactly one [`TxReceipt`] on the
/// provided channel.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait SendQueue: Send + Sync {
    /// Submits a candidate for sending.
    async fn send(
        &self,
        tx: TxRef,
        candidate: TxCandidate,
        receipts: mpsc::Sender<TxReceipt>,
    ) -> Result<(), QueueClosed>;

    /// Waits until no transaction is in flight.
    async fn wait(&self);

    /// Whether the queue still accepts sends.
    fn is_closed(&self) -> bool;
}
