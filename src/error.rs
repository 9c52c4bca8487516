//! Depacketization error types.
//!
//! Errors are split in two layers. [`ParsingError`] covers malformed or truncated
//! payloads: the packet is dropped and the stream state is left untouched, so the
//! caller can simply continue with the next packet. [`DepacketizeError`] is the
//! error returned by every public operation and wraps parsing failures together
//! with resource and lifecycle errors. Loss of continuity is never an error; it is
//! reported through the `corrupt` flag of emitted access units.

use thiserror::Error;

use crate::types::StreamId;

/// Errors raised while interpreting the bytes of a transport packet.
///
/// Every variant belongs to the `InvalidData` class: it is locally recoverable
/// and never fatal for the stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    /// Insufficient data to parse a complete field or structure.
    #[error("Incomplete packet data: needed {needed} bytes, got {got} for {context}")]
    NotEnoughData {
        needed: usize,
        got: usize,
        context: &'static str,
    },

    /// A field contained an invalid or unsupported value.
    #[error("Invalid value for field '{field}': {description}")]
    InvalidFieldValue {
        field: &'static str,
        description: String,
    },

    /// The transport header did not carry RTP version 2.
    #[error("Invalid RTP version: expected 2, got {0}")]
    InvalidRtpVersion(u8),
}

/// Main error type for depacketization operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DepacketizeError {
    /// Malformed or truncated packet; the packet was dropped.
    #[error("Invalid data: {0}")]
    Parsing(#[from] ParsingError),

    /// The unit in progress would exceed the configured maximum size and was
    /// dropped. The packet itself may be well formed.
    #[error("Access unit of {size} bytes exceeds the limit of {limit} bytes")]
    UnitTooLarge { size: usize, limit: usize },

    /// Growing a reassembly buffer failed.
    #[error("Out of memory: could not grow reassembly buffer by {requested} bytes")]
    OutOfMemory { requested: usize },

    /// An accumulator was driven in an order its owner never should (open twice,
    /// close while closed). Indicates a handler bug, not bad input.
    #[error("Accumulator misuse: {0}")]
    AccumulatorState(String),

    /// No stream state exists for the given id.
    #[error("Unknown stream: {0}")]
    UnknownStream(StreamId),

    /// A stream with the given id has already been initialized.
    #[error("Stream already initialized: {0}")]
    StreamExists(StreamId),

    /// No handler is registered for the negotiated payload format name.
    #[error("Unsupported payload format: {0}")]
    UnsupportedFormat(String),

    /// A negotiated format parameter has a value the handler cannot work with.
    #[error("Invalid format parameter {key}={value}: {reason}")]
    InvalidParameter {
        key: String,
        value: String,
        reason: String,
    },

    /// Unexpected internal logic error, likely a bug in this crate.
    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl DepacketizeError {
    /// Returns `true` if the stream can keep receiving packets after this error.
    ///
    /// Only buffer growth failures and internal bugs are stream-level failures.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            DepacketizeError::OutOfMemory { .. } | DepacketizeError::Internal(_)
        )
    }

    /// Returns `true` if this error rejected a malformed packet.
    pub fn is_invalid_data(&self) -> bool {
        matches!(self, DepacketizeError::Parsing(_))
    }
}
