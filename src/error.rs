//! Error kinds surfaced by the format codec, chunked streams, and archive
//! reader/writer. One variant per row of the error table: nothing is
//! swallowed, and structured fields live on the variant itself so callers
//! can match instead of parsing messages.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApackError {
    #[error("invalid format at offset {offset}: expected magic {expected:?}, found {found:?}")]
    InvalidFormat {
        offset: u64,
        expected: &'static [u8],
        found: Vec<u8>,
    },

    #[error("unsupported version: archive requires {required}, reader supports {supported}")]
    UnsupportedVersion { required: u16, supported: u16 },

    #[error("truncated input: expected {expected} bytes, {remaining} remaining")]
    TruncatedInput { expected: u64, remaining: u64 },

    #[error("out of bounds: {field} = {value} (allowed {min}..={max})")]
    OutOfBounds {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("checksum mismatch at chunk {chunk_index}: expected {expected}, actual {actual}")]
    ChecksumMismatch {
        expected: String,
        actual: String,
        chunk_index: i32,
    },

    #[error("integrity failure in {algorithm}")]
    Integrity { algorithm: &'static str },

    #[error("decompression failed ({algorithm}): {detail}")]
    DecompressionFailed {
        algorithm: &'static str,
        detail: String,
    },

    #[error("entry not found: {0}")]
    EntryNotFound(String),

    #[error("unsupported algorithm: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ApackError>;
