use rollup_batcher_providers::{BlobProviderError, ProviderError};

/// A failed provider call underlying a [`DerivationError`].
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Chain provider error.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Blob provider error.
    #[error(transparent)]
    Blob(#[from] BlobProviderError),
}

/// A derivation failure, classified by how the pipeline must react.
#[derive(Debug, thiserror::Error)]
pub enum DerivationError {
    /// Transient failure. Retrying on a later tick may succeed; the pipeline
    /// keeps its state.
    #[error("temporary derivation error: {0}")]
    Temporary(#[source] SourceError),
    /// The referenced data is gone or the chain view is inconsistent. The
    /// pipeline must reset to a safe origin before continuing.
    #[error("derivation reset required: {0}")]
    Reset(#[source] SourceError),
    /// An upstream inconsistency that should be impossible. Surfaced loudly
    /// instead of continuing with corrupted state.
    #[error("fatal derivation error: {0}")]
    Fatal(&'static str),
}

impl DerivationError {
    /// Returns whether the pipeline may simply retry later.
    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    /// Returns whether the pipeline must reset before continuing.
    pub const fn is_reset(&self) -> bool {
        matches!(self, Self::Reset(_))
    }
}
