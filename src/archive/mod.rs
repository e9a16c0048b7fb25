//! High-level `Archive` facade over [`reader::ArchiveReader`] and
//! [`writer::ArchiveWriter`], mirroring the teacher's `archive.rs`
//! (`Archive`/`PackOptions`) — a convenience wrapper, not new format logic.

pub mod reader;
pub mod writer;

pub use reader::{ArchiveReader, EntryView};
pub use writer::ArchiveWriter;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::Result;
use crate::format::constants::{
    CHECKSUM_XXH3_64, COMPRESSION_ZSTD, DEFAULT_CHUNK_SIZE, ENCRYPTION_NONE,
};
use crate::format::{Attribute, EncryptionBlock};

/// Writer-side configuration, analogous to the teacher's `PackOptions`.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub chunk_size: i64,
    pub checksum_algo_id: u8,
    pub compression_algo_id: i32,
    pub compression_level: i32,
    pub encryption_algo_id: i32,
    /// Raw content key, already unwrapped — deriving it from a password is
    /// an external collaborator's job (spec.md §1 Non-goals).
    pub encryption_key: Option<Vec<u8>>,
    pub aad: Option<Vec<u8>>,
    /// Opaque transport block describing how `encryption_key` was wrapped.
    /// Required when `encryption_key` is set.
    pub encryption_block: Option<EncryptionBlock>,
    pub stream_mode: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            checksum_algo_id: CHECKSUM_XXH3_64,
            compression_algo_id: COMPRESSION_ZSTD,
            compression_level: 3,
            encryption_algo_id: ENCRYPTION_NONE,
            encryption_key: None,
            aad: None,
            encryption_block: None,
            stream_mode: false,
        }
    }
}

/// Security/validation settings for reading, analogous to the teacher's
/// implicit defaults in `SixCyReader::with_key`.
#[derive(Debug, Clone, Default)]
pub struct ReaderOptions {
    pub security: crate::stream::ChunkSecuritySettings,
    pub encryption_key: Option<Vec<u8>>,
    pub aad: Option<Vec<u8>>,
}

pub struct FileInfo {
    pub entry_id: i64,
    pub name: String,
    pub mime_type: String,
    pub original_size: i64,
    pub stored_size: i64,
    pub attributes: Vec<Attribute>,
}

impl From<&EntryView> for FileInfo {
    fn from(v: &EntryView) -> Self {
        Self {
            entry_id: v.entry_id,
            name: v.name.clone(),
            mime_type: v.mime_type.clone(),
            original_size: v.original_size,
            stored_size: v.stored_size,
            attributes: v.attributes.clone(),
        }
    }
}

/// Ergonomic entry point: open an existing archive for reading, or create
/// one for writing, backed by a plain `File`.
pub enum Archive {
    Read(ArchiveReader<BufReader<File>>),
    Write(ArchiveWriter<BufWriter<File>>),
}

impl Archive {
    pub fn create(path: impl AsRef<Path>, config: ArchiveConfig) -> Result<Self> {
        let file = File::create(path)?;
        let writer = ArchiveWriter::create(BufWriter::new(file), config)?;
        Ok(Archive::Write(writer))
    }

    pub fn open(path: impl AsRef<Path>, options: ReaderOptions) -> Result<Self> {
        let file = File::open(path)?;
        let reader = ArchiveReader::open(BufReader::new(file), options)?;
        Ok(Archive::Read(reader))
    }

    fn read_only() -> crate::error::ApackError {
        crate::error::ApackError::Unsupported("archive is open for writing, not reading".into())
    }

    fn write_only() -> crate::error::ApackError {
        crate::error::ApackError::Unsupported("archive is open for reading, not writing".into())
    }

    pub fn add_entry(
        &mut self,
        name: &str,
        mime_type: &str,
        attributes: Vec<Attribute>,
        data: impl std::io::Read,
    ) -> Result<i64> {
        match self {
            Archive::Write(w) => w.add_entry(name, mime_type, attributes, data),
            Archive::Read(_) => Err(Self::read_only()),
        }
    }

    pub fn finalize(self) -> Result<()> {
        match self {
            Archive::Write(w) => w.finalize().map(|_| ()),
            Archive::Read(_) => Err(Self::read_only()),
        }
    }

    pub fn list(&mut self) -> Result<Vec<FileInfo>> {
        match self {
            Archive::Read(r) => Ok(r.list_entries()?.iter().map(FileInfo::from).collect()),
            Archive::Write(_) => Err(Self::write_only()),
        }
    }

    pub fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        match self {
            Archive::Read(r) => r.read_by_name(name),
            Archive::Write(_) => Err(Self::write_only()),
        }
    }

    pub fn read_file_by_id(&mut self, id: i64) -> Result<Vec<u8>> {
        match self {
            Archive::Read(r) => r.read_by_id(id),
            Archive::Write(_) => Err(Self::write_only()),
        }
    }
}
