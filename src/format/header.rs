//! FileHeader: the fixed 64-byte anchor at offset 0 of every archive.
//!
//! Written once on finalize, read once on open — the same "accumulate,
//! CRC, validate magic first" sequence the format's other records follow.

use crate::error::{ApackError, Result};
use crate::format::constants::*;
use crate::primitives::{check_range, ByteReader, ByteWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub version_major: u16,
    pub version_minor: u16,
    pub version_patch: u16,
    pub compat_level: u16,
    pub mode_flags: u8,
    pub checksum_algo_id: u8,
    pub chunk_size: i32,
    pub entry_count: i64,
    pub trailer_offset: i64,
    pub creation_timestamp: i64,
}

impl FileHeader {
    pub fn new(mode_flags: u8, checksum_algo_id: u8, chunk_size: i32, creation_timestamp: i64) -> Self {
        Self {
            version_major: CURRENT_VERSION_MAJOR,
            version_minor: CURRENT_VERSION_MINOR,
            version_patch: CURRENT_VERSION_PATCH,
            compat_level: CURRENT_COMPAT_LEVEL,
            mode_flags,
            checksum_algo_id,
            chunk_size,
            entry_count: 0,
            trailer_offset: 0,
            creation_timestamp,
        }
    }

    pub fn is_stream_mode(&self) -> bool {
        self.mode_flags & MODE_STREAM != 0
    }

    pub fn is_encrypted(&self) -> bool {
        self.mode_flags & MODE_ENCRYPTED != 0
    }

    pub fn is_random_access(&self) -> bool {
        self.mode_flags & MODE_RANDOM_ACCESS != 0
    }

    pub fn write(&self) -> [u8; FILE_HEADER_SIZE] {
        let mut w = ByteWriter::with_capacity(FILE_HEADER_SIZE);
        w.write_bytes(FILE_MAGIC);
        w.write_u16(self.version_major);
        w.write_u16(self.version_minor);
        w.write_u16(self.version_patch);
        w.write_u16(self.compat_level);
        w.write_u8(self.mode_flags);
        w.write_u8(self.checksum_algo_id);
        w.write_i32(self.chunk_size);
        // header_crc32 over the first 20 bytes, computed now and spliced in.
        let crc = crc32fast::hash(&w.as_slice()[0..20]);
        w.write_i32(crc as i32);
        w.write_i64(self.entry_count);
        w.write_i64(self.trailer_offset);
        w.write_i64(self.creation_timestamp);
        w.write_bytes(&[0u8; 16]);
        let v = w.into_vec();
        let mut out = [0u8; FILE_HEADER_SIZE];
        out.copy_from_slice(&v);
        out
    }

    /// Write with a finalized entry_count/trailer_offset (used when
    /// back-patching the header at finalize time).
    pub fn with_counts(mut self, entry_count: i64, trailer_offset: i64) -> Self {
        self.entry_count = entry_count;
        self.trailer_offset = trailer_offset;
        self
    }

    pub fn read(buf: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(buf);
        let magic = r.read_bytes(6)?;
        if magic != FILE_MAGIC {
            return Err(ApackError::InvalidFormat {
                offset: 0,
                expected: FILE_MAGIC,
                found: magic.to_vec(),
            });
        }
        let version_major = r.read_u16()?;
        let version_minor = r.read_u16()?;
        let version_patch = r.read_u16()?;
        let compat_level = r.read_u16()?;
        if compat_level > CURRENT_COMPAT_LEVEL {
            return Err(ApackError::UnsupportedVersion {
                required: compat_level,
                supported: CURRENT_COMPAT_LEVEL,
            });
        }
        let mode_flags = r.read_u8()?;
        let checksum_algo_id = r.read_u8()?;
        let chunk_size = r.read_i32()?;
        check_range("chunk_size", chunk_size as i64, MIN_CHUNK_SIZE, MAX_CHUNK_SIZE)?;
        let header_crc32 = r.read_i32()?;
        let computed = crc32fast::hash(&buf[0..20]) as i32;
        if header_crc32 != computed {
            return Err(ApackError::ChecksumMismatch {
                expected: format!("{computed:08x}"),
                actual: format!("{header_crc32:08x}"),
                chunk_index: -1,
            });
        }
        let entry_count = r.read_i64()?;
        check_range("entry_count", entry_count, 0, MAX_ENTRY_COUNT)?;
        let trailer_offset = r.read_i64()?;
        let creation_timestamp = r.read_i64()?;
        r.skip(16)?;
        Ok(Self {
            version_major,
            version_minor,
            version_patch,
            compat_level,
            mode_flags,
            checksum_algo_id,
            chunk_size,
            entry_count,
            trailer_offset,
            creation_timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let h = FileHeader::new(MODE_RANDOM_ACCESS, CHECKSUM_XXH3_64, 4096, 1_700_000_000_000)
            .with_counts(3, 64);
        let bytes = h.write();
        assert_eq!(bytes.len(), FILE_HEADER_SIZE);
        let back = FileHeader::read(&bytes).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = FileHeader::new(0, CHECKSUM_XXH3_64, 4096, 0).write();
        bytes[0] = b'X';
        let err = FileHeader::read(&bytes).unwrap_err();
        assert!(matches!(err, ApackError::InvalidFormat { .. }));
    }

    #[test]
    fn rejects_chunk_size_out_of_bounds() {
        let mut h = FileHeader::new(0, CHECKSUM_XXH3_64, 4096, 0);
        h.chunk_size = 1;
        let bytes = h.write();
        let err = FileHeader::read(&bytes).unwrap_err();
        assert!(matches!(err, ApackError::OutOfBounds { .. }));
    }
}
