//! ChunkHeader: the fixed 24-byte header preceding every chunk's stored
//! bytes. No CRC of its own; its checksum field covers the chunk payload
//! and is verified by the chunked input stream, not by this codec.

use crate::error::{ApackError, Result};
use crate::format::constants::*;
use crate::primitives::{ByteReader, ByteWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub chunk_index: i32,
    pub original_size: i32,
    pub stored_size: i32,
    pub checksum: i32,
    pub flags: i32,
}

impl ChunkHeader {
    pub fn is_last(&self) -> bool {
        self.flags & CHUNK_FLAG_LAST != 0
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & CHUNK_FLAG_COMPRESSED != 0
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags & CHUNK_FLAG_ENCRYPTED != 0
    }

    pub fn write(&self) -> [u8; CHUNK_HEADER_SIZE] {
        let mut w = ByteWriter::with_capacity(CHUNK_HEADER_SIZE);
        w.write_bytes(CHUNK_MAGIC);
        w.write_i32(self.chunk_index);
        w.write_i32(self.original_size);
        w.write_i32(self.stored_size);
        w.write_i32(self.checksum);
        w.write_i32(self.flags);
        let v = w.into_vec();
        let mut out = [0u8; CHUNK_HEADER_SIZE];
        out.copy_from_slice(&v);
        out
    }

    pub fn read(buf: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(buf);
        let magic = r.read_bytes(4)?;
        if magic != CHUNK_MAGIC {
            return Err(ApackError::InvalidFormat {
                offset: 0,
                expected: CHUNK_MAGIC,
                found: magic.to_vec(),
            });
        }
        let chunk_index = r.read_i32()?;
        let original_size = r.read_i32()?;
        let stored_size = r.read_i32()?;
        let checksum = r.read_i32()?;
        let flags = r.read_i32()?;
        Ok(Self {
            chunk_index,
            original_size,
            stored_size,
            checksum,
            flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let c = ChunkHeader {
            chunk_index: 2,
            original_size: 4096,
            stored_size: 2048,
            checksum: 0x1234_5678,
            flags: CHUNK_FLAG_COMPRESSED,
        };
        let bytes = c.write();
        assert_eq!(bytes.len(), CHUNK_HEADER_SIZE);
        assert_eq!(ChunkHeader::read(&bytes).unwrap(), c);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = ChunkHeader {
            chunk_index: 0,
            original_size: 0,
            stored_size: 0,
            checksum: 0,
            flags: CHUNK_FLAG_LAST,
        }
        .write();
        bytes[3] = b'!';
        assert!(matches!(ChunkHeader::read(&bytes), Err(ApackError::InvalidFormat { .. })));
    }
}
