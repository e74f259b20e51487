//! Codec error type.

use thiserror::Error;

/// Error type for BSON encoding and decoding operations.
///
/// Errors are raised at the site of detection and abort the whole call;
/// partial output is discarded and nothing is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BsonError {
    /// Registry construction is missing a carrier constructor.
    #[error("missing type constructor for {0} (required: Long/ObjectID/Binary/Code/DBRef/Symbol/Double/Timestamp/MinKey/MaxKey)")]
    MissingConstructor(&'static str),
    /// Strict-key mode: field name starts with `$`.
    #[error("key {0} must not start with '$'")]
    KeyStartsWithDollar(String),
    /// Strict-key mode: field name contains `.`.
    #[error("key {0} must not contain '.'")]
    KeyContainsDot(String),
    /// Value is not encodable as given.
    #[error("cannot serialize value: {0}")]
    UnsupportedValue(&'static str),
    /// Integer magnitude exceeds every lossless host-number encoding.
    #[error("integer {0} exceeds 2^53; use the Long carrier to preserve it")]
    IntegerOverflow(i64),
    /// Caller-supplied output buffer cannot hold the encoding.
    #[error("output buffer too small: need {needed} bytes at offset {offset}, have {available}")]
    BufferTooSmall {
        needed: usize,
        offset: usize,
        available: usize,
    },
    /// Declared document length extends beyond the input buffer.
    #[error("document length {declared} exceeds remaining input {remaining}")]
    TruncatedInput { declared: usize, remaining: usize },
    /// A fixed-width read ran off the end of the input.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// Unknown element type tag.
    #[error("unknown BSON element type 0x{0:02x}")]
    CorruptTag(u8),
    /// cstring with no NUL terminator before the end of the region.
    #[error("cstring missing NUL terminator")]
    UnterminatedCString,
    /// Declared document length disagrees with the bytes consumed.
    #[error("document declared {declared} bytes but parsing consumed {consumed}")]
    LengthMismatch { declared: usize, consumed: usize },
    /// Invalid UTF-8 in a string or cstring.
    #[error("invalid UTF-8 in string data")]
    InvalidUtf8,
}

impl From<bson_pack_buffers::BufferError> for BsonError {
    fn from(err: bson_pack_buffers::BufferError) -> Self {
        match err {
            bson_pack_buffers::BufferError::OutOfBounds => BsonError::UnexpectedEof,
            bson_pack_buffers::BufferError::Overflow => BsonError::UnsupportedValue(
                "encoded size disagrees with precomputed size",
            ),
        }
    }
}
