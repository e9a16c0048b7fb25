//! ArchiveReader: open steps and per-entry lookup from spec.md §4.6.
//!
//! Grounded on `SixCyReader::with_key` (superblock → seek to index →
//! validated index block → `FileIndex`) for the random-access path, and on
//! `SixCyReader::scan_blocks` for the index-absent fallback — APACK's
//! RANDOM_ACCESS/STREAM_MODE split is the direct generalization of the
//! teacher's index-present/index-absent reader paths.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use crate::archive::ReaderOptions;
use crate::checksum;
use crate::codec;
use crate::crypto;
use crate::error::{ApackError, Result};
use crate::format::constants::*;
use crate::format::{Attribute, EncryptionBlock, FileHeader, TocEntry};
use crate::stream::{ChunkReaderConfig, ChunkedInputStream};

#[derive(Debug, Clone)]
pub struct EntryView {
    pub entry_id: i64,
    pub name: String,
    pub mime_type: String,
    pub original_size: i64,
    pub stored_size: i64,
    pub compression_id: i32,
    pub encryption_id: i32,
    pub attributes: Vec<Attribute>,
    data_offset: u64,
}

impl EntryView {
    /// Byte offset of this entry's first chunk within the archive.
    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }
}

enum ReaderMode {
    RandomAccess {
        toc: Vec<TocEntry>,
        by_id: HashMap<i64, usize>,
        by_name_hash: HashMap<i32, Vec<usize>>,
    },
    /// Data offset of the archive's single entry (spec.md §4.7: stream-mode
    /// writing "only supports a single entry").
    Stream { entry_offset: u64 },
}

pub struct ArchiveReader<R: Read + Seek> {
    source: R,
    file_header: FileHeader,
    encryption_block: Option<EncryptionBlock>,
    options: ReaderOptions,
    mode: ReaderMode,
}

impl<R: Read + Seek> ArchiveReader<R> {
    pub fn open(mut source: R, options: ReaderOptions) -> Result<Self> {
        let mut header_buf = [0u8; FILE_HEADER_SIZE];
        source.read_exact(&mut header_buf)?;
        let file_header = FileHeader::read(&header_buf)?;

        let encryption_block = if file_header.is_encrypted() {
            Some(EncryptionBlock::read_from(&mut source)?)
        } else {
            None
        };

        let mode = if file_header.is_random_access() {
            let data_end = source.stream_position()?;
            let _ = data_end;
            source.seek(SeekFrom::Start(file_header.trailer_offset as u64))?;
            let trailer = crate::format::trailer::Trailer::read_from(&mut source)?;

            let actual_len = source.seek(SeekFrom::End(0))?;
            if actual_len as i64 != trailer.file_size {
                return Err(ApackError::OutOfBounds {
                    field: "file_size",
                    value: actual_len as i64,
                    min: trailer.file_size,
                    max: trailer.file_size,
                });
            }

            let mut by_id = HashMap::new();
            let mut by_name_hash: HashMap<i32, Vec<usize>> = HashMap::new();
            for (i, entry) in trailer.toc.iter().enumerate() {
                by_id.insert(entry.entry_id, i);
                by_name_hash.entry(entry.name_hash).or_default().push(i);
            }
            ReaderMode::RandomAccess {
                toc: trailer.toc,
                by_id,
                by_name_hash,
            }
        } else {
            let entry_offset = source.stream_position()?;
            ReaderMode::Stream { entry_offset }
        };

        tracing::debug!(random_access = file_header.is_random_access(), "opened archive");

        Ok(Self {
            source,
            file_header,
            encryption_block,
            options,
            mode,
        })
    }

    fn open_header_at(&mut self, offset: u64) -> Result<(crate::format::EntryHeader, u64)> {
        self.source.seek(SeekFrom::Start(offset))?;
        let header = crate::format::EntryHeader::read_from(&mut self.source)?;
        let data_offset = self.source.stream_position()?;
        Ok((header, data_offset))
    }

    fn to_view(entry_id: i64, header: crate::format::EntryHeader, data_offset: u64) -> EntryView {
        EntryView {
            entry_id,
            name: header.name,
            mime_type: header.mime_type,
            original_size: header.original_size,
            stored_size: header.stored_size,
            compression_id: header.compression_id,
            encryption_id: header.encryption_id,
            attributes: header.attributes,
            data_offset,
        }
    }

    pub fn get_by_id(&mut self, id: i64) -> Result<EntryView> {
        let (offset,) = match &self.mode {
            ReaderMode::RandomAccess { toc, by_id, .. } => {
                let idx = *by_id
                    .get(&id)
                    .ok_or_else(|| ApackError::EntryNotFound(id.to_string()))?;
                (toc[idx].entry_offset as u64,)
            }
            ReaderMode::Stream { .. } => {
                return Err(ApackError::Unsupported("stream-mode archives have no id index".into()))
            }
        };
        let (header, data_offset) = self.open_header_at(offset)?;
        Ok(Self::to_view(id, header, data_offset))
    }

    pub fn get_by_name(&mut self, name: &str) -> Result<EntryView> {
        let hash = crate::format::name_hash(name);
        let candidates: Vec<(i64, u64)> = match &self.mode {
            ReaderMode::RandomAccess { toc, by_name_hash, .. } => by_name_hash
                .get(&hash)
                .map(|idxs| idxs.iter().map(|&i| (toc[i].entry_id, toc[i].entry_offset as u64)).collect())
                .unwrap_or_default(),
            ReaderMode::Stream { entry_offset } => vec![(0, *entry_offset)],
        };
        for (entry_id, offset) in candidates {
            let (header, data_offset) = self.open_header_at(offset)?;
            if header.name == name {
                return Ok(Self::to_view(entry_id, header, data_offset));
            }
        }
        Err(ApackError::EntryNotFound(name.to_string()))
    }

    /// Opens every entry header. Cheap per-entry metadata (id, offsets,
    /// sizes) lives in the TOC already; names require reading each header,
    /// since the TOC only stores a name hash.
    pub fn list_entries(&mut self) -> Result<Vec<EntryView>> {
        match &self.mode {
            ReaderMode::RandomAccess { toc, .. } => {
                let entries: Vec<(i64, u64)> = toc.iter().map(|e| (e.entry_id, e.entry_offset as u64)).collect();
                entries
                    .into_iter()
                    .map(|(id, offset)| {
                        let (header, data_offset) = self.open_header_at(offset)?;
                        Ok(Self::to_view(id, header, data_offset))
                    })
                    .collect()
            }
            ReaderMode::Stream { entry_offset } => {
                let offset = *entry_offset;
                let (header, data_offset) = self.open_header_at(offset)?;
                Ok(vec![Self::to_view(0, header, data_offset)])
            }
        }
    }

    fn chunk_reader_config(&self, view: &EntryView) -> Result<ChunkReaderConfig> {
        let checksum = checksum::get_by_id(self.file_header.checksum_algo_id)?;
        let compression = if view.compression_id == COMPRESSION_NONE {
            None
        } else {
            Some(codec::get_by_id(view.compression_id)?)
        };
        let encryption = if view.encryption_id == ENCRYPTION_NONE {
            None
        } else {
            let cipher = crypto::get_by_id(view.encryption_id)?;
            let key = self
                .options
                .encryption_key
                .clone()
                .ok_or(ApackError::Integrity { algorithm: "aead" })?;
            Some((cipher, key, self.options.aad.clone()))
        };
        Ok(ChunkReaderConfig {
            checksum,
            compression,
            encryption,
            security: self.options.security,
        })
    }

    /// Opens a chunked stream over one entry's payload.
    pub fn open_entry(&mut self, view: &EntryView) -> Result<ChunkedInputStream<&mut R>> {
        let config = self.chunk_reader_config(view)?;
        self.source.seek(SeekFrom::Start(view.data_offset))?;
        Ok(ChunkedInputStream::new(&mut self.source, config))
    }

    fn read_all(&mut self, view: EntryView) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(view.original_size.max(0) as usize);
        let mut stream = self.open_entry(&view)?;
        while let Some(bytes) = stream.read_chunk()? {
            out.extend_from_slice(&bytes);
        }
        Ok(out)
    }

    pub fn read_by_id(&mut self, id: i64) -> Result<Vec<u8>> {
        let view = self.get_by_id(id)?;
        self.read_all(view)
    }

    pub fn read_by_name(&mut self, name: &str) -> Result<Vec<u8>> {
        let view = self.get_by_name(name)?;
        self.read_all(view)
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }
}
