//! ArchiveWriter: forward-pass writer with back-patched headers, from
//! spec.md §4.7.
//!
//! Grounded on `SixCyWriter::add_file`/`finalize` (write placeholder header,
//! stream the body, seek back to patch in final sizes, append the index at
//! the end) — APACK's TOC-based trailer is the direct generalization of the
//! teacher's `FileIndex` trailer.

use std::io::{Seek, SeekFrom, Write};

use crate::archive::ArchiveConfig;
use crate::checksum;
use crate::codec;
use crate::crypto;
use crate::error::{ApackError, Result};
use crate::format::constants::*;
use crate::format::toc::name_hash;
use crate::format::{Attribute, EntryHeader, FileHeader, StreamTrailer, TocEntry, Trailer};
use crate::stream::{ChunkWriterConfig, ChunkedOutputStream};

pub struct ArchiveWriter<W: Write + Seek> {
    sink: W,
    config: ArchiveConfig,
    toc: Vec<TocEntry>,
    next_entry_id: i64,
    total_original: i64,
    total_stored: i64,
    stream_entry_written: bool,
    last_chunk_count: i32,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    pub fn create(mut sink: W, config: ArchiveConfig) -> Result<Self> {
        if config.encryption_algo_id != ENCRYPTION_NONE && config.encryption_block.is_none() {
            return Err(ApackError::InvalidFormat {
                offset: 0,
                expected: b"encryption_block present when encryption_algo_id is set",
                found: Vec::new(),
            });
        }

        let mut mode_flags = 0u8;
        if config.stream_mode {
            mode_flags |= MODE_STREAM;
        } else {
            mode_flags |= MODE_RANDOM_ACCESS;
        }
        if config.encryption_algo_id != ENCRYPTION_NONE {
            mode_flags |= MODE_ENCRYPTED;
        }
        if config.compression_algo_id != COMPRESSION_NONE {
            mode_flags |= MODE_COMPRESSED;
        }

        let header = FileHeader::new(
            mode_flags,
            config.checksum_algo_id,
            config.chunk_size as i32,
            now_unix_millis(),
        );
        sink.write_all(&header.write())?;

        if let Some(block) = &config.encryption_block {
            sink.write_all(&block.write())?;
        }

        tracing::debug!(stream_mode = config.stream_mode, "created archive");

        Ok(Self {
            sink,
            config,
            toc: Vec::new(),
            next_entry_id: 0,
            total_original: 0,
            total_stored: 0,
            stream_entry_written: false,
            last_chunk_count: 0,
        })
    }

    fn chunk_writer_config(&self) -> Result<ChunkWriterConfig> {
        let checksum = checksum::get_by_id(self.config.checksum_algo_id)?;
        let compression = if self.config.compression_algo_id == COMPRESSION_NONE {
            None
        } else {
            Some((codec::get_by_id(self.config.compression_algo_id)?, self.config.compression_level))
        };
        let encryption = if self.config.encryption_algo_id == ENCRYPTION_NONE {
            None
        } else {
            let cipher = crypto::get_by_id(self.config.encryption_algo_id)?;
            let key = self
                .config
                .encryption_key
                .clone()
                .ok_or(ApackError::Integrity { algorithm: "aead" })?;
            Some((cipher, key, self.config.aad.clone()))
        };
        Ok(ChunkWriterConfig {
            chunk_size: self.config.chunk_size as usize,
            checksum,
            compression,
            encryption,
        })
    }

    /// Adds one entry, streaming `reader` through the chunked pipeline.
    /// Returns the assigned entry_id.
    pub fn add_entry(
        &mut self,
        name: &str,
        mime_type: &str,
        attributes: Vec<Attribute>,
        mut reader: impl std::io::Read,
    ) -> Result<i64> {
        if self.config.stream_mode && self.stream_entry_written {
            return Err(ApackError::Unsupported("stream-mode archives hold only a single entry".into()));
        }

        let entry_id = self.next_entry_id;
        self.next_entry_id += 1;

        let entry_offset = self.sink.stream_position()?;

        let mut placeholder = EntryHeader::new(
            entry_id,
            name,
            self.config.compression_algo_id,
            self.config.encryption_algo_id,
        );
        placeholder.mime_type = mime_type.to_string();
        placeholder.attributes = attributes;
        let header_bytes = placeholder.write()?;
        let header_len = header_bytes.len() as u64;
        self.sink.write_all(&header_bytes)?;

        let writer_config = self.chunk_writer_config()?;
        let mut buf = [0u8; 64 * 1024];
        let mut chunk_stream = ChunkedOutputStream::new(&mut self.sink, writer_config);
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            chunk_stream.write(&buf[..n])?;
        }
        let (_sink, chunk_count, total_original, total_stored) = chunk_stream.finish()?;

        let data_end = self.sink.stream_position()?;

        let mut finalized = placeholder;
        finalized.original_size = total_original;
        finalized.stored_size = total_stored;
        finalized.chunk_count = chunk_count;
        let final_header_bytes = finalized.write()?;
        debug_assert_eq!(final_header_bytes.len() as u64, header_len);

        self.sink.seek(SeekFrom::Start(entry_offset))?;
        self.sink.write_all(&final_header_bytes)?;
        self.sink.seek(SeekFrom::Start(data_end))?;

        let header_crc32 = crc32fast::hash(&final_header_bytes) as i32;

        self.toc.push(TocEntry {
            entry_id,
            entry_offset: entry_offset as i64,
            original_size: total_original,
            stored_size: total_stored,
            name_hash: name_hash(name),
            header_crc32,
        });
        self.total_original += total_original;
        self.total_stored += total_stored;
        self.stream_entry_written = true;
        self.last_chunk_count = chunk_count;

        tracing::debug!(entry_id, name, chunk_count, total_original, total_stored, "wrote entry");
        Ok(entry_id)
    }

    /// Writes the trailer (TOC or StreamTrailer) and back-patches the file
    /// header with its final entry_count/trailer_offset.
    pub fn finalize(mut self) -> Result<W> {
        let trailer_offset = self.sink.stream_position()?;

        if self.config.stream_mode {
            let last = self
                .toc
                .last()
                .ok_or(ApackError::Unsupported("stream-mode archive has no entry to finalize".into()))?;
            let stream_trailer = StreamTrailer {
                original_size: last.original_size,
                stored_size: last.stored_size,
                chunk_count: self.last_chunk_count,
            };
            self.sink.write_all(&stream_trailer.write())?;
            let file_size = self.sink.stream_position()?;

            self.sink.seek(SeekFrom::Start(0))?;
            let header = FileHeader::new(
                MODE_STREAM
                    | if self.config.compression_algo_id != COMPRESSION_NONE { MODE_COMPRESSED } else { 0 }
                    | if self.config.encryption_algo_id != ENCRYPTION_NONE { MODE_ENCRYPTED } else { 0 },
                self.config.checksum_algo_id,
                self.config.chunk_size as i32,
                now_unix_millis(),
            )
            .with_counts(1, trailer_offset as i64);
            self.sink.write_all(&header.write())?;
            let _ = file_size;
            self.sink.seek(SeekFrom::End(0))?;
        } else {
            let entry_count = self.toc.len() as i64;
            let placeholder = Trailer::new(entry_count, self.total_original, self.total_stored, 0, self.toc.clone());
            let placeholder_bytes = placeholder.write();
            let file_size = trailer_offset + placeholder_bytes.len() as u64;
            let trailer = Trailer::new(entry_count, self.total_original, self.total_stored, file_size as i64, self.toc.clone());
            self.sink.write_all(&trailer.write())?;

            self.sink.seek(SeekFrom::Start(0))?;
            let header = FileHeader::new(
                MODE_RANDOM_ACCESS
                    | if self.config.compression_algo_id != COMPRESSION_NONE { MODE_COMPRESSED } else { 0 }
                    | if self.config.encryption_algo_id != ENCRYPTION_NONE { MODE_ENCRYPTED } else { 0 },
                self.config.checksum_algo_id,
                self.config.chunk_size as i32,
                now_unix_millis(),
            )
            .with_counts(entry_count, trailer_offset as i64);
            self.sink.write_all(&header.write())?;
            self.sink.seek(SeekFrom::End(0))?;
        }

        tracing::debug!(entries = self.toc.len(), "finalized archive");
        Ok(self.sink)
    }
}

/// Archive creation timestamps aren't meant to round-trip through tests
/// bit-for-bit, so callers can't observe nondeterminism from this directly;
/// it only ever feeds the purely informational `creation_timestamp` field.
fn now_unix_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::reader::ArchiveReader;
    use crate::archive::ReaderOptions;
    use std::io::Cursor;

    fn cursor_sink() -> Cursor<Vec<u8>> {
        Cursor::new(Vec::new())
    }

    #[test]
    fn random_access_round_trips_two_entries() {
        let mut config = ArchiveConfig::default();
        config.compression_algo_id = COMPRESSION_ZSTD;
        let mut writer = ArchiveWriter::create(cursor_sink(), config).unwrap();
        writer.add_entry("a.txt", "text/plain", vec![], &b"hello world"[..]).unwrap();
        writer.add_entry("b.bin", "application/octet-stream", vec![], &vec![9u8; 5000][..]).unwrap();
        let sink = writer.finalize().unwrap();

        let mut reader = ArchiveReader::open(Cursor::new(sink.into_inner()), ReaderOptions::default()).unwrap();
        let entries = reader.list_entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(reader.read_by_name("a.txt").unwrap(), b"hello world");
        assert_eq!(reader.read_by_name("b.bin").unwrap(), vec![9u8; 5000]);
    }

    #[test]
    fn empty_archive_is_128_bytes() {
        let config = ArchiveConfig::default();
        let writer = ArchiveWriter::create(cursor_sink(), config).unwrap();
        let sink = writer.finalize().unwrap();
        assert_eq!(sink.into_inner().len(), 128);
    }

    #[test]
    fn stream_mode_rejects_second_entry() {
        let mut config = ArchiveConfig::default();
        config.stream_mode = true;
        let mut writer = ArchiveWriter::create(cursor_sink(), config).unwrap();
        writer.add_entry("only.txt", "text/plain", vec![], &b"data"[..]).unwrap();
        let err = writer.add_entry("second.txt", "text/plain", vec![], &b"data"[..]).unwrap_err();
        assert!(matches!(err, ApackError::Unsupported(_)));
    }
}
