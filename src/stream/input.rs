//! ChunkedInputStream: read chunk header → validate bounds/ratio → read
//! stored bytes → decrypt → decompress → verify checksum → emit.
//!
//! State machine: `READ_HEADER → READ_BYTES → [DECRYPT] → [DECOMPRESS] →
//! VERIFY_CHECKSUM → EMIT`. Terminal states map onto [`crate::error::ApackError`]
//! variants: magic/bounds failures are `InvalidFormat`/`OutOfBounds`, AEAD or
//! checksum failures are `Integrity`/`ChecksumMismatch`, EOF before a LAST
//! chunk after at least one chunk is `TruncatedInput`.

use std::io::Read;

use crate::checksum::{truncate_to_chunk_field, ChecksumAlgorithm};
use crate::codec::CompressionAlgorithm;
use crate::crypto::AeadCipher;
use crate::error::{ApackError, Result};
use crate::format::chunk::ChunkHeader;
use crate::format::constants::{CHUNK_HEADER_SIZE, DEFAULT_MAX_CHUNK_SIZE_SECURITY, DEFAULT_MAX_COMPRESSION_RATIO, DEFAULT_MAX_ENCRYPTION_OVERHEAD};

/// Bounds enforced per chunk, independent of the format's own size limits —
/// these exist to defeat decompression bombs and malicious archives.
#[derive(Debug, Clone, Copy)]
pub struct ChunkSecuritySettings {
    pub max_chunk_size: i64,
    pub max_compression_ratio: i64,
    pub max_encryption_overhead: i64,
    pub validate_checksums: bool,
}

impl Default for ChunkSecuritySettings {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE_SECURITY,
            max_compression_ratio: DEFAULT_MAX_COMPRESSION_RATIO,
            max_encryption_overhead: DEFAULT_MAX_ENCRYPTION_OVERHEAD,
            validate_checksums: true,
        }
    }
}

pub struct ChunkReaderConfig {
    pub checksum: &'static (dyn ChecksumAlgorithm + Sync),
    pub compression: Option<&'static (dyn CompressionAlgorithm + Sync)>,
    pub encryption: Option<(&'static (dyn AeadCipher + Sync), Vec<u8>, Option<Vec<u8>>)>,
    pub security: ChunkSecuritySettings,
}

pub struct ChunkedInputStream<R: Read> {
    source: R,
    config: ChunkReaderConfig,
    expected_index: i32,
    done: bool,
}

impl<R: Read> ChunkedInputStream<R> {
    pub fn new(source: R, config: ChunkReaderConfig) -> Self {
        Self {
            source,
            config,
            expected_index: 0,
            done: false,
        }
    }

    /// Reads and fully validates the next chunk, returning its decoded
    /// bytes. `Ok(None)` means the stream has ended after a LAST chunk (or,
    /// for `expected_index == 0`, ended with no chunks at all).
    pub fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.done {
            return Ok(None);
        }

        let mut header_buf = [0u8; CHUNK_HEADER_SIZE];
        match self.source.read_exact(&mut header_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                if self.expected_index == 0 {
                    self.done = true;
                    return Ok(None);
                }
                return Err(ApackError::TruncatedInput {
                    expected: CHUNK_HEADER_SIZE as u64,
                    remaining: 0,
                });
            }
            Err(e) => return Err(e.into()),
        }

        let header = ChunkHeader::read(&header_buf)?;
        self.validate_header(&header)?;

        let mut stored = vec![0u8; header.stored_size as usize];
        self.source.read_exact(&mut stored).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                ApackError::TruncatedInput {
                    expected: header.stored_size as u64,
                    remaining: 0,
                }
            } else {
                e.into()
            }
        })?;

        let mut bytes = stored;
        if header.is_encrypted() {
            let (cipher, key, aad) = self
                .config
                .encryption
                .as_ref()
                .ok_or(ApackError::Integrity { algorithm: "aead" })?;
            bytes = cipher.decrypt(&bytes, key, aad.as_deref())?;
        }

        if header.is_compressed() {
            let codec = self
                .config
                .compression
                .ok_or(ApackError::Unsupported("chunk is compressed but no compression provider configured".into()))?;
            bytes = codec.decompress(&bytes, header.original_size as usize)?;
            if bytes.len() != header.original_size as usize {
                return Err(ApackError::DecompressionFailed {
                    algorithm: "compression",
                    detail: format!(
                        "decompressed length {} != original_size {}",
                        bytes.len(),
                        header.original_size
                    ),
                });
            }
        }

        if self.config.security.validate_checksums {
            let actual = self.config.checksum.compute(&bytes);
            let actual_trunc = truncate_to_chunk_field(actual);
            if actual_trunc != header.checksum {
                return Err(ApackError::ChecksumMismatch {
                    expected: format!("{:08x}", header.checksum),
                    actual: format!("{actual_trunc:08x}"),
                    chunk_index: header.chunk_index,
                });
            }
        }

        self.expected_index += 1;
        if header.is_last() {
            self.done = true;
        }
        Ok(Some(bytes))
    }

    fn validate_header(&self, header: &ChunkHeader) -> Result<()> {
        if header.chunk_index != self.expected_index {
            return Err(ApackError::OutOfBounds {
                field: "chunk_index",
                value: header.chunk_index as i64,
                min: self.expected_index as i64,
                max: self.expected_index as i64,
            });
        }
        let sec = &self.config.security;
        if header.original_size < 0 || header.original_size as i64 > sec.max_chunk_size {
            return Err(ApackError::OutOfBounds {
                field: "chunk.original_size",
                value: header.original_size as i64,
                min: 0,
                max: sec.max_chunk_size,
            });
        }
        if header.stored_size < 0 || header.stored_size as i64 > sec.max_chunk_size {
            return Err(ApackError::OutOfBounds {
                field: "chunk.stored_size",
                value: header.stored_size as i64,
                min: 0,
                max: sec.max_chunk_size,
            });
        }

        let compressed = header.is_compressed();
        let encrypted = header.is_encrypted();
        let original = header.original_size as i64;
        let stored = header.stored_size as i64;

        if !compressed && !encrypted && original != stored {
            return Err(ApackError::OutOfBounds {
                field: "chunk.stored_size",
                value: stored,
                min: original,
                max: original,
            });
        }
        if encrypted && !compressed {
            let max_overhead = sec.max_encryption_overhead;
            if stored < original || stored > original + max_overhead {
                return Err(ApackError::OutOfBounds {
                    field: "chunk.stored_size",
                    value: stored,
                    min: original,
                    max: original + max_overhead,
                });
            }
        }
        if compressed {
            // Rejected here, before any decompression buffer is allocated:
            // this is the decompression-bomb guard.
            if stored == 0 {
                if original != 0 {
                    return Err(ApackError::OutOfBounds {
                        field: "chunk.original_size",
                        value: original,
                        min: 0,
                        max: 0,
                    });
                }
            } else if original > stored * sec.max_compression_ratio {
                return Err(ApackError::OutOfBounds {
                    field: "chunk.original_size",
                    value: original,
                    min: 0,
                    max: stored * sec.max_compression_ratio,
                });
            }
            if !encrypted && stored > original {
                return Err(ApackError::OutOfBounds {
                    field: "chunk.stored_size",
                    value: stored,
                    min: 0,
                    max: original,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum;
    use crate::codec;
    use crate::format::constants::{CHECKSUM_XXH3_64, COMPRESSION_ZSTD};
    use crate::stream::output::{ChunkWriterConfig, ChunkedOutputStream};

    fn writer_config(chunk_size: usize) -> ChunkWriterConfig {
        ChunkWriterConfig {
            chunk_size,
            checksum: checksum::get_by_id(CHECKSUM_XXH3_64).unwrap(),
            compression: Some((codec::get_by_id(COMPRESSION_ZSTD).unwrap(), 3)),
            encryption: None,
        }
    }

    fn reader_config() -> ChunkReaderConfig {
        ChunkReaderConfig {
            checksum: checksum::get_by_id(CHECKSUM_XXH3_64).unwrap(),
            compression: Some(codec::get_by_id(COMPRESSION_ZSTD).unwrap()),
            encryption: None,
            security: ChunkSecuritySettings::default(),
        }
    }

    #[test]
    fn round_trips_multi_chunk_payload() {
        let mut w = ChunkedOutputStream::new(Vec::new(), writer_config(4096));
        let payload = vec![7u8; 10_000];
        w.write(&payload).unwrap();
        let (sink, _chunks, _orig, _stored) = w.finish().unwrap();

        let mut r = ChunkedInputStream::new(sink.as_slice(), reader_config());
        let mut out = Vec::new();
        while let Some(bytes) = r.read_chunk().unwrap() {
            out.extend_from_slice(&bytes);
        }
        assert_eq!(out, payload);
    }

    #[test]
    fn empty_stream_with_no_chunks_is_ok() {
        let mut r = ChunkedInputStream::new(&[][..], reader_config());
        assert!(r.read_chunk().unwrap().is_none());
    }

    #[test]
    fn tampered_checksum_is_rejected() {
        let mut w = ChunkedOutputStream::new(Vec::new(), writer_config(4096));
        w.write(b"hello").unwrap();
        let (mut sink, _c, _o, _s) = w.finish().unwrap();
        let last = sink.len() - 1;
        sink[last] ^= 0xFF;

        let mut r = ChunkedInputStream::new(sink.as_slice(), reader_config());
        let err = r.read_chunk().unwrap_err();
        assert!(matches!(
            err,
            ApackError::ChecksumMismatch { .. } | ApackError::DecompressionFailed { .. }
        ));
    }

    #[test]
    fn decompression_bomb_header_is_rejected_before_allocating() {
        let header = ChunkHeader {
            chunk_index: 0,
            original_size: 10_000_000,
            stored_size: 1,
            checksum: 0,
            flags: crate::format::constants::CHUNK_FLAG_COMPRESSED | crate::format::constants::CHUNK_FLAG_LAST,
        };
        let mut bytes = header.write().to_vec();
        bytes.push(0); // one stored byte
        let mut r = ChunkedInputStream::new(bytes.as_slice(), reader_config());
        let err = r.read_chunk().unwrap_err();
        assert!(matches!(err, ApackError::OutOfBounds { field: "chunk.original_size", .. }));
    }

    #[test]
    fn truncation_before_last_chunk_is_an_error() {
        let mut w = ChunkedOutputStream::new(Vec::new(), writer_config(4096));
        w.write(&vec![3u8; 10_000]).unwrap();
        let (sink, _c, _o, _s) = w.finish().unwrap();
        let truncated = &sink[0..sink.len() - 10];

        let mut r = ChunkedInputStream::new(truncated, reader_config());
        let mut err = None;
        loop {
            match r.read_chunk() {
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(e) => {
                    err = Some(e);
                    break;
                }
            }
        }
        assert!(matches!(err, Some(ApackError::TruncatedInput { .. })));
    }
}
