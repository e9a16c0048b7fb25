//! # apack — random-access binary archive format
//!
//! Format guarantees:
//! - All numeric fields are little-endian; never negotiated
//! - Every record is self-describing: magic, version where applicable, CRC32
//! - Entries are split into independently checksummed, optionally compressed
//!   and AEAD-encrypted chunks
//! - A trailing table of contents gives O(1) lookup by entry id or name hash
//!   in random-access mode; stream mode holds exactly one entry and is
//!   readable by sequential scan alone

pub mod archive;
pub mod checksum;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod format;
pub mod primitives;
pub mod recovery;
pub mod stream;

pub use archive::{Archive, ArchiveConfig, FileInfo, ReaderOptions};
pub use error::{ApackError, Result};
pub use recovery::{scan_file, EntryHealth, RecoveryQuality, RecoveryReport};
