use alloy_primitives::U256;

/// An error occurring while encoding or decoding one of the wire formats
/// owned by this crate.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    /// The payload length matches neither the fixed-field length nor a
    /// fixed-field length plus trailing bytes.
    #[error("data is unexpected length: {0}")]
    UnexpectedLength(usize),
    /// The 4-byte function selector does not match the expected one.
    #[error("invalid function selector")]
    InvalidSelector,
    /// A fixed-width word carried non-zero bytes in its padding.
    #[error("word padding was not empty")]
    InvalidPadding,
    /// Bytes remained after all fields were decoded.
    #[error("too many bytes")]
    TrailingBytes,
    /// The payload ended before all fields were decoded.
    #[error("unexpected end of data")]
    UnexpectedEndOfData,
    /// A frame carries more data than a channel may hold.
    #[error("frame data too large: {0} bytes")]
    FrameTooLarge(usize),
    /// The frame is_last byte is neither 0 nor 1.
    #[error("invalid is_last marker: {0}")]
    InvalidMarker(u8),
    /// The payload version byte is not a known derivation version.
    #[error("unsupported derivation version: {0}")]
    UnsupportedVersion(u8),
    /// An error decoding a deposit log event.
    #[error(transparent)]
    Deposit(#[from] DepositError),
}

/// An error occurring while decoding a deposit log event.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DepositError {
    /// The log does not carry the deposit event topic.
    #[error("unexpected event topic")]
    UnexpectedTopic,
    /// The log carries the wrong number of topics.
    #[error("expected 4 event topics, got {0}")]
    UnexpectedTopicCount(usize),
    /// The deposit event version is not supported.
    #[error("invalid deposit version, got {0}")]
    InvalidVersion(U256),
    /// The ABI bytes envelope around the opaque data is malformed.
    #[error("malformed deposit event data, length {0}")]
    MalformedEventData(usize),
    /// The opaque data is shorter than its fixed fields.
    #[error("malformed deposit opaque data, length {0}")]
    MalformedOpaqueData(usize),
}
