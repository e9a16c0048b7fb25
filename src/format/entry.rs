//! EntryHeader: per-entry metadata, aligned to 8 bytes, minimum 56 bytes
//! before the variable name/mime_type/attribute region.

use crate::error::{ApackError, Result};
use crate::format::attribute::Attribute;
use crate::format::constants::*;
use crate::primitives::{check_range, ByteReader, ByteWriter};

#[derive(Debug, Clone, PartialEq)]
pub struct EntryHeader {
    pub header_version: u16,
    pub flags: u16,
    pub entry_id: i64,
    pub original_size: i64,
    pub stored_size: i64,
    pub chunk_count: i32,
    pub compression_id: i32,
    pub encryption_id: i32,
    pub name: String,
    pub mime_type: String,
    pub attributes: Vec<Attribute>,
}

impl EntryHeader {
    pub fn new(entry_id: i64, name: impl Into<String>, compression_id: i32, encryption_id: i32) -> Self {
        Self {
            header_version: 1,
            flags: 0,
            entry_id,
            original_size: 0,
            stored_size: 0,
            chunk_count: 0,
            compression_id,
            encryption_id,
            name: name.into(),
            mime_type: String::new(),
            attributes: Vec::new(),
        }
    }

    fn flags_for(&self) -> u16 {
        let mut f = 0u16;
        if !self.attributes.is_empty() {
            f |= ENTRY_FLAG_HAS_ATTRIBUTES;
        }
        if self.compression_id != COMPRESSION_NONE {
            f |= ENTRY_FLAG_COMPRESSED;
        }
        if self.encryption_id != ENCRYPTION_NONE {
            f |= ENTRY_FLAG_ENCRYPTED;
        }
        f
    }

    pub fn write(&self) -> Result<Vec<u8>> {
        check_range("name_len", self.name.len() as i64, 0, MAX_ENTRY_NAME_LEN as i64)?;
        check_range("mime_type_len", self.mime_type.len() as i64, 0, u16::MAX as i64)?;
        check_range("original_size", self.original_size, 0, MAX_ENTRY_SIZE)?;
        check_range("stored_size", self.stored_size, 0, MAX_ENTRY_SIZE)?;

        let mut w = ByteWriter::with_capacity(ENTRY_HEADER_MIN_SIZE + self.name.len() + self.mime_type.len());
        w.write_bytes(ENTRY_MAGIC);
        w.write_u16(self.header_version);
        w.write_u16(self.flags_for());
        w.write_i64(self.entry_id);
        w.write_i64(self.original_size);
        w.write_i64(self.stored_size);
        w.write_i32(self.chunk_count);
        w.write_i32(self.compression_id);
        w.write_i32(self.encryption_id);
        w.write_u16(self.name.len() as u16);
        w.write_u16(self.mime_type.len() as u16);
        w.write_i32(self.attributes.len() as i32);
        // header_crc32 computed over the 52 preceding bytes (everything
        // fixed-size up to and including attribute_count).
        let crc = crc32fast::hash(&w.as_slice()[0..52]);
        w.write_i32(crc as i32);
        w.write_bytes(self.name.as_bytes());
        w.write_bytes(self.mime_type.as_bytes());
        for attr in &self.attributes {
            attr.write(&mut w);
        }
        w.pad_to_alignment(ENTRY_ALIGNMENT);
        Ok(w.into_vec())
    }

    /// Reads a header whose variable-length fields fit entirely in `buf`.
    /// Returns the header and the number of bytes consumed (including
    /// alignment padding), so the caller can seek past it.
    pub fn read(buf: &[u8]) -> Result<(Self, usize)> {
        let mut r = ByteReader::new(buf);
        let magic = r.read_bytes(4)?;
        if magic != ENTRY_MAGIC {
            return Err(ApackError::InvalidFormat {
                offset: 0,
                expected: ENTRY_MAGIC,
                found: magic.to_vec(),
            });
        }
        let header_version = r.read_u16()?;
        let flags = r.read_u16()?;
        let entry_id = r.read_i64()?;
        let original_size = r.read_i64()?;
        check_range("original_size", original_size, 0, MAX_ENTRY_SIZE)?;
        let stored_size = r.read_i64()?;
        check_range("stored_size", stored_size, 0, MAX_ENTRY_SIZE)?;
        let chunk_count = r.read_i32()?;
        let compression_id = r.read_i32()?;
        let encryption_id = r.read_i32()?;
        let name_len = r.read_u16()?;
        check_range("name_len", name_len as i64, 0, MAX_ENTRY_NAME_LEN as i64)?;
        let mime_type_len = r.read_u16()?;
        let attribute_count = r.read_i32()?;
        let header_crc32 = r.read_i32()?;
        let computed = crc32fast::hash(&buf[0..52]) as i32;
        if header_crc32 != computed {
            return Err(ApackError::ChecksumMismatch {
                expected: format!("{computed:08x}"),
                actual: format!("{header_crc32:08x}"),
                chunk_index: -1,
            });
        }
        let name = r.read_utf8(name_len as usize)?;
        let mime_type = r.read_utf8(mime_type_len as usize)?;
        let mut attributes = Vec::with_capacity(attribute_count.max(0) as usize);
        for _ in 0..attribute_count {
            attributes.push(Attribute::read(&mut r)?);
        }
        r.skip_to_alignment(ENTRY_ALIGNMENT)?;
        Ok((
            Self {
                header_version,
                flags,
                entry_id,
                original_size,
                stored_size,
                chunk_count,
                compression_id,
                encryption_id,
                name,
                mime_type,
                attributes,
            },
            r.position(),
        ))
    }

    /// Streaming variant for a `Read` source positioned at the start of an
    /// entry header, whose total length (including attributes) isn't known
    /// up front. Reads the fixed prefix to learn the variable-region
    /// lengths, then the name/mime/attributes directly off the stream.
    pub fn read_from<R: std::io::Read>(source: &mut R) -> Result<Self> {
        let mut prefix = [0u8; ENTRY_HEADER_MIN_SIZE];
        source.read_exact(&mut prefix)?;
        let mut r = ByteReader::new(&prefix);
        let magic = r.read_bytes(4)?;
        if magic != ENTRY_MAGIC {
            return Err(ApackError::InvalidFormat {
                offset: 0,
                expected: ENTRY_MAGIC,
                found: magic.to_vec(),
            });
        }
        let header_version = r.read_u16()?;
        let flags = r.read_u16()?;
        let entry_id = r.read_i64()?;
        let original_size = r.read_i64()?;
        check_range("original_size", original_size, 0, MAX_ENTRY_SIZE)?;
        let stored_size = r.read_i64()?;
        check_range("stored_size", stored_size, 0, MAX_ENTRY_SIZE)?;
        let chunk_count = r.read_i32()?;
        let compression_id = r.read_i32()?;
        let encryption_id = r.read_i32()?;
        let name_len = r.read_u16()?;
        check_range("name_len", name_len as i64, 0, MAX_ENTRY_NAME_LEN as i64)?;
        let mime_type_len = r.read_u16()?;
        let attribute_count = r.read_i32()?;
        let header_crc32 = r.read_i32()?;
        let computed = crc32fast::hash(&prefix[0..52]) as i32;
        if header_crc32 != computed {
            return Err(ApackError::ChecksumMismatch {
                expected: format!("{computed:08x}"),
                actual: format!("{header_crc32:08x}"),
                chunk_index: -1,
            });
        }

        let mut name_buf = vec![0u8; name_len as usize];
        source.read_exact(&mut name_buf)?;
        let name = String::from_utf8(name_buf).map_err(|e| ApackError::InvalidFormat {
            offset: 0,
            expected: b"utf-8",
            found: e.into_bytes(),
        })?;

        let mut mime_buf = vec![0u8; mime_type_len as usize];
        source.read_exact(&mut mime_buf)?;
        let mime_type = String::from_utf8(mime_buf).map_err(|e| ApackError::InvalidFormat {
            offset: 0,
            expected: b"utf-8",
            found: e.into_bytes(),
        })?;

        let mut consumed = ENTRY_HEADER_MIN_SIZE + name_len as usize + mime_type_len as usize;
        let mut attributes = Vec::with_capacity(attribute_count.max(0) as usize);
        for _ in 0..attribute_count {
            let mut attr_prefix = [0u8; 8];
            source.read_exact(&mut attr_prefix)?;
            let mut ar = ByteReader::new(&attr_prefix);
            let key_len = ar.read_u16()?;
            let value_type = ar.read_u8()?;
            let _reserved = ar.read_u8()?;
            let value_len = ar.read_i32()?;
            check_range("attribute.value_len", value_len as i64, 0, MAX_CHUNK_SIZE)?;

            let mut key_buf = vec![0u8; key_len as usize];
            source.read_exact(&mut key_buf)?;
            let mut value_buf = vec![0u8; value_len as usize];
            source.read_exact(&mut value_buf)?;

            let mut whole = attr_prefix.to_vec();
            whole.extend_from_slice(&key_buf);
            whole.extend_from_slice(&value_buf);
            let mut wr = ByteReader::new(&whole);
            attributes.push(crate::format::attribute::Attribute::read(&mut wr)?);

            consumed += 8 + key_len as usize + value_len as usize;
        }

        let aligned = (consumed + ENTRY_ALIGNMENT - 1) & !(ENTRY_ALIGNMENT - 1);
        let pad = aligned - consumed;
        if pad > 0 {
            let mut pad_buf = vec![0u8; pad];
            source.read_exact(&mut pad_buf)?;
        }

        Ok(Self {
            header_version,
            flags,
            entry_id,
            original_size,
            stored_size,
            chunk_count,
            compression_id,
            encryption_id,
            name,
            mime_type,
            attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::attribute::AttributeValue;

    #[test]
    fn round_trips_with_attributes_and_alignment() {
        let mut h = EntryHeader::new(1, "hello.txt", COMPRESSION_ZSTD, ENCRYPTION_NONE);
        h.original_size = 13;
        h.stored_size = 9;
        h.chunk_count = 1;
        h.attributes.push(Attribute::new("k", AttributeValue::Int64(7)));
        let bytes = h.write().unwrap();
        assert_eq!(bytes.len() % ENTRY_ALIGNMENT, 0);
        let (back, consumed) = EntryHeader::read(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(back.name, "hello.txt");
        assert_eq!(back.attributes, h.attributes);
        assert_eq!(back.flags & ENTRY_FLAG_HAS_ATTRIBUTES, ENTRY_FLAG_HAS_ATTRIBUTES);
    }

    #[test]
    fn rejects_bad_magic() {
        let h = EntryHeader::new(1, "a", COMPRESSION_NONE, ENCRYPTION_NONE);
        let mut bytes = h.write().unwrap();
        bytes[0] = b'X';
        assert!(matches!(EntryHeader::read(&bytes), Err(ApackError::InvalidFormat { .. })));
    }
}
