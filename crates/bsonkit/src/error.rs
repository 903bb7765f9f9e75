//! Encoder and decoder error types.

use bsonkit_buffers::BufferError;
use thiserror::Error;

/// Error type for BSON encoding operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A document, string or binary payload does not fit its 32-bit length field.
    #[error("value too large for a 32-bit BSON length")]
    ValueTooLarge,
    /// A key, regex pattern or regex flag string contains a NUL byte.
    #[error("embedded NUL byte in key or pattern {0:?}")]
    EmbeddedNulInKeyOrPattern(String),
}

/// Error type for BSON decoding operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A declared length or fixed-size read runs past the available bytes.
    #[error("unexpected end of input")]
    TruncatedInput,
    /// A declared length disagrees with the bytes actually consumed.
    #[error("declared length does not match content")]
    LengthMismatch,
    /// An element tag is not a supported BSON type.
    #[error("unsupported BSON element type: 0x{0:02x}")]
    UnknownType(u8),
    /// A key or string payload is not valid UTF-8.
    #[error("invalid UTF-8")]
    InvalidUtf8,
    /// Documents are nested deeper than the configured maximum.
    #[error("document nesting exceeds maximum depth of {0}")]
    NestingTooDeep(usize),
    /// A boolean payload byte is neither 0 nor 1.
    #[error("invalid boolean byte: 0x{0:02x}")]
    InvalidBoolean(u8),
    /// An array element key is not the next decimal index (strict mode only).
    #[error("unexpected array key {0:?}")]
    InvalidArrayKey(String),
}

impl From<BufferError> for DecodeError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::EndOfBuffer => DecodeError::TruncatedInput,
            BufferError::InvalidUtf8 => DecodeError::InvalidUtf8,
        }
    }
}
