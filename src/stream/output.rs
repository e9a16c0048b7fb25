//! ChunkedOutputStream: buffer to chunk_size, then checksum → compress →
//! encrypt → emit one ChunkHeader + stored bytes per flush.

use std::io::Write;

use crate::checksum::{truncate_to_chunk_field, ChecksumAlgorithm};
use crate::codec::CompressionAlgorithm;
use crate::crypto::AeadCipher;
use crate::error::Result;
use crate::format::chunk::ChunkHeader;
use crate::format::constants::{CHUNK_FLAG_COMPRESSED, CHUNK_FLAG_ENCRYPTED, CHUNK_FLAG_LAST};

pub struct ChunkWriterConfig {
    pub chunk_size: usize,
    pub checksum: &'static (dyn ChecksumAlgorithm + Sync),
    pub compression: Option<(&'static (dyn CompressionAlgorithm + Sync), i32)>,
    pub encryption: Option<(&'static (dyn AeadCipher + Sync), Vec<u8>, Option<Vec<u8>>)>,
}

pub struct ChunkedOutputStream<W: Write> {
    sink: W,
    config: ChunkWriterConfig,
    buffer: Vec<u8>,
    chunk_index: i32,
    chunks_written: i32,
    total_original_bytes: i64,
    total_stored_bytes: i64,
    finished: bool,
}

impl<W: Write> ChunkedOutputStream<W> {
    pub fn new(sink: W, config: ChunkWriterConfig) -> Self {
        Self {
            sink,
            buffer: Vec::with_capacity(config.chunk_size),
            config,
            chunk_index: 0,
            chunks_written: 0,
            total_original_bytes: 0,
            total_stored_bytes: 0,
            finished: false,
        }
    }

    pub fn chunks_written(&self) -> i32 {
        self.chunks_written
    }

    pub fn total_original_bytes(&self) -> i64 {
        self.total_original_bytes
    }

    pub fn total_stored_bytes(&self) -> i64 {
        self.total_stored_bytes
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(bytes);
        while self.buffer.len() >= self.config.chunk_size {
            let rest = self.buffer.split_off(self.config.chunk_size);
            let chunk = std::mem::replace(&mut self.buffer, rest);
            self.flush_chunk(&chunk, false)?;
        }
        Ok(())
    }

    /// Flush any buffered bytes as the final chunk, marking it LAST. Emits
    /// exactly one chunk even for a zero-byte entry.
    pub fn finish(mut self) -> Result<(W, i32, i64, i64)> {
        let remaining = std::mem::take(&mut self.buffer);
        self.flush_chunk(&remaining, true)?;
        self.finished = true;
        Ok((
            self.sink,
            self.chunks_written,
            self.total_original_bytes,
            self.total_stored_bytes,
        ))
    }

    fn flush_chunk(&mut self, data: &[u8], is_last: bool) -> Result<()> {
        let checksum = self.config.checksum.compute(data);

        let (mut stored, compressed) = match self.config.compression {
            Some((codec, level)) => {
                let candidate = codec.compress(data, level)?;
                if candidate.len() >= data.len() {
                    (data.to_vec(), false)
                } else {
                    (candidate, true)
                }
            }
            None => (data.to_vec(), false),
        };

        let encrypted = if let Some((cipher, key, aad)) = &self.config.encryption {
            stored = cipher.encrypt(&stored, key, aad.as_deref())?;
            true
        } else {
            false
        };

        let mut flags = 0i32;
        if is_last {
            flags |= CHUNK_FLAG_LAST;
        }
        if compressed {
            flags |= CHUNK_FLAG_COMPRESSED;
        }
        if encrypted {
            flags |= CHUNK_FLAG_ENCRYPTED;
        }

        let header = ChunkHeader {
            chunk_index: self.chunk_index,
            original_size: data.len() as i32,
            stored_size: stored.len() as i32,
            checksum: truncate_to_chunk_field(checksum),
            flags,
        };

        tracing::trace!(chunk_index = self.chunk_index, original = data.len(), stored = stored.len(), compressed, encrypted, "flushing chunk");

        self.sink.write_all(&header.write())?;
        self.sink.write_all(&stored)?;

        self.chunk_index += 1;
        self.chunks_written += 1;
        self.total_original_bytes += data.len() as i64;
        self.total_stored_bytes += stored.len() as i64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum;
    use crate::codec;
    use crate::format::constants::{CHECKSUM_XXH3_64, COMPRESSION_ZSTD};

    fn config(chunk_size: usize) -> ChunkWriterConfig {
        ChunkWriterConfig {
            chunk_size,
            checksum: checksum::get_by_id(CHECKSUM_XXH3_64).unwrap(),
            compression: Some((codec::get_by_id(COMPRESSION_ZSTD).unwrap(), 3)),
            encryption: None,
        }
    }

    #[test]
    fn zero_byte_entry_emits_one_last_chunk() {
        let stream = ChunkedOutputStream::new(Vec::new(), config(4096));
        let (sink, chunks, orig, stored) = stream.finish().unwrap();
        assert_eq!(chunks, 1);
        assert_eq!(orig, 0);
        assert!(stored >= 0);
        assert!(!sink.is_empty()); // header bytes at least
    }

    #[test]
    fn multi_chunk_entry_splits_on_chunk_size() {
        let mut stream = ChunkedOutputStream::new(Vec::new(), config(4096));
        stream.write(&vec![0u8; 10_000]).unwrap();
        let (_sink, chunks, orig, _stored) = stream.finish().unwrap();
        assert_eq!(chunks, 3);
        assert_eq!(orig, 10_000);
    }
}
