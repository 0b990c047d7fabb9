//! Provider traits for the external collaborators of the batch submitter and
//! the derivation data source, plus an online beacon client for blob
//! retrieval.

pub use error::{BlobProviderError, ProviderError};
mod error;

pub use l1::{BlobProvider, L1Provider};
mod l1;

pub use l2::{L2Provider, RollupProvider};
mod l2;

pub use beacon::OnlineBeaconClient;
mod beacon;
