//! TocEntry: fixed 40-byte table-of-contents record. Looked up by entry_id
//! directly, or by name_hash with a full-name comparison to resolve
//! collisions (a hash-based linear scan, per spec — not O(log N)).

use crate::error::Result;
use crate::format::constants::TOC_ENTRY_SIZE;
use crate::primitives::{ByteReader, ByteWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocEntry {
    pub entry_id: i64,
    pub entry_offset: i64,
    pub original_size: i64,
    pub stored_size: i64,
    pub name_hash: i32,
    pub header_crc32: i32,
}

impl TocEntry {
    pub fn write(&self, w: &mut ByteWriter) {
        w.write_i64(self.entry_id);
        w.write_i64(self.entry_offset);
        w.write_i64(self.original_size);
        w.write_i64(self.stored_size);
        w.write_i32(self.name_hash);
        w.write_i32(self.header_crc32);
    }

    pub fn read(r: &mut ByteReader) -> Result<Self> {
        Ok(Self {
            entry_id: r.read_i64()?,
            entry_offset: r.read_i64()?,
            original_size: r.read_i64()?,
            stored_size: r.read_i64()?,
            name_hash: r.read_i32()?,
            header_crc32: r.read_i32()?,
        })
    }
}

/// Lower 32 bits of XXH3-64 over a UTF-8 name, used both as TocEntry.name_hash
/// and as the index key for name-based lookup.
pub fn name_hash(name: &str) -> i32 {
    (xxhash_rust::xxh3::xxh3_64(name.as_bytes()) as u32) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let e = TocEntry {
            entry_id: 1,
            entry_offset: 64,
            original_size: 13,
            stored_size: 13,
            name_hash: name_hash("hello.txt"),
            header_crc32: 0xDEAD_BEEFu32 as i32,
        };
        let mut w = ByteWriter::new();
        e.write(&mut w);
        let bytes = w.into_vec();
        assert_eq!(bytes.len(), TOC_ENTRY_SIZE);
        let mut r = ByteReader::new(&bytes);
        assert_eq!(TocEntry::read(&mut r).unwrap(), e);
    }

    #[test]
    fn name_hash_is_deterministic() {
        assert_eq!(name_hash("a"), name_hash("a"));
        assert_ne!(name_hash("a"), name_hash("b"));
    }
}
