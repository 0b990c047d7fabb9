use alloy_primitives::B256;
use alloy_transport::{RpcError, TransportErrorKind};

/// An error occurring at one of the chain providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The requested resource does not exist on the queried node.
    #[error("resource not found")]
    NotFound,
    /// RPC error.
    #[error(transparent)]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// Other error.
    #[error("{0}")]
    Other(&'static str),
}

impl ProviderError {
    /// Returns whether the error reports a missing resource rather than a
    /// transport failure.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// An error occurring at the blob provider.
#[derive(Debug, thiserror::Error)]
pub enum BlobProviderError {
    /// No sidecars are available for the slot.
    #[error("no blob sidecars found for slot {0}")]
    NotFound(u64),
    /// The bundle for the slot does not carry the requested sidecar index.
    #[error("missing blob sidecar at index {0}")]
    SidecarMissing(u64),
    /// The sidecar commitment does not hash to the requested versioned hash.
    #[error("versioned hash mismatch at index {index}: expected {expected}, got {got}")]
    VersionedHashMismatch {
        /// The sidecar index.
        index: u64,
        /// The hash referenced by the transaction.
        expected: B256,
        /// The hash computed from the sidecar commitment.
        got: B256,
    },
    /// The block timestamp predates the beacon genesis.
    #[error("invalid block timestamp: genesis {0}, provided {1}")]
    InvalidBlockTimestamp(u64, u64),
    /// Beacon request failed.
    #[error("beacon provider error: {0}")]
    Request(#[from] reqwest::Error),
}

impl BlobProviderError {
    /// Returns whether the error reports missing blob data, as opposed to a
    /// transport failure or an inconsistency. Missing data may reappear once
    /// a lagging beacon node catches up.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::SidecarMissing(_))
    }
}
