//! Trailer (random-access mode) and StreamTrailer (stream mode), the two
//! tail structures that close out an archive.

use crate::error::{ApackError, Result};
use crate::format::constants::*;
use crate::format::toc::TocEntry;
use crate::primitives::{check_range, ByteReader, ByteWriter};

pub const TRAILER_HEADER_SIZE: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct Trailer {
    pub version: i32,
    pub toc_offset: i64,
    pub entry_count: i64,
    pub total_original_size: i64,
    pub total_stored_size: i64,
    pub file_size: i64,
    pub toc: Vec<TocEntry>,
}

impl Trailer {
    pub fn new(
        entry_count: i64,
        total_original_size: i64,
        total_stored_size: i64,
        file_size: i64,
        toc: Vec<TocEntry>,
    ) -> Self {
        Self {
            version: 1,
            toc_offset: TRAILER_HEADER_SIZE as i64,
            entry_count,
            total_original_size,
            total_stored_size,
            file_size,
            toc,
        }
    }

    pub fn toc_size(&self) -> i64 {
        self.entry_count * TOC_ENTRY_SIZE as i64
    }

    pub fn write(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(TRAILER_HEADER_SIZE + self.toc.len() * TOC_ENTRY_SIZE);
        w.write_bytes(TRAILER_MAGIC);
        w.write_i32(self.version);
        w.write_i64(self.toc_offset);
        w.write_i64(self.toc_size());
        w.write_i64(self.entry_count);
        w.write_i64(self.total_original_size);
        w.write_i64(self.total_stored_size);

        let mut toc_buf = ByteWriter::with_capacity(self.toc.len() * TOC_ENTRY_SIZE);
        for e in &self.toc {
            e.write(&mut toc_buf);
        }
        let toc_bytes = toc_buf.into_vec();
        let toc_crc32 = crc32fast::hash(&toc_bytes) as i32;
        w.write_i32(toc_crc32);

        // trailer_crc32 covers every header byte except its own field:
        // the 52 bytes written so far, plus file_size written after it.
        let prefix = w.as_slice().to_vec();
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&prefix);
        hasher.update(&self.file_size.to_le_bytes());
        let trailer_crc32 = hasher.finalize() as i32;
        w.write_i32(trailer_crc32);
        w.write_i64(self.file_size);
        w.write_bytes(&toc_bytes);
        w.into_vec()
    }

    /// Parses the 64-byte trailer header plus its TOC from `buf` (which must
    /// contain at least the header and may contain extra trailing bytes).
    pub fn read(buf: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(buf);
        let magic = r.read_bytes(4)?;
        if magic != TRAILER_MAGIC {
            return Err(ApackError::InvalidFormat {
                offset: 0,
                expected: TRAILER_MAGIC,
                found: magic.to_vec(),
            });
        }
        let version = r.read_i32()?;
        let toc_offset = r.read_i64()?;
        let toc_size = r.read_i64()?;
        let entry_count = r.read_i64()?;
        let total_original_size = r.read_i64()?;
        let total_stored_size = r.read_i64()?;
        let toc_crc32 = r.read_i32()?;
        let trailer_crc32 = r.read_i32()?;
        let file_size = r.read_i64()?;

        check_range("entry_count", entry_count, 0, MAX_ENTRY_COUNT)?;

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&buf[0..52]);
        hasher.update(&file_size.to_le_bytes());
        let computed = hasher.finalize() as i32;
        if computed != trailer_crc32 {
            return Err(ApackError::ChecksumMismatch {
                expected: format!("{computed:08x}"),
                actual: format!("{trailer_crc32:08x}"),
                chunk_index: -1,
            });
        }

        if toc_size != entry_count * TOC_ENTRY_SIZE as i64 {
            return Err(ApackError::OutOfBounds {
                field: "toc_size",
                value: toc_size,
                min: entry_count * TOC_ENTRY_SIZE as i64,
                max: entry_count * TOC_ENTRY_SIZE as i64,
            });
        }

        let toc_bytes = r.read_bytes(toc_size as usize)?;
        let computed_toc_crc = crc32fast::hash(toc_bytes) as i32;
        if computed_toc_crc != toc_crc32 {
            return Err(ApackError::ChecksumMismatch {
                expected: format!("{computed_toc_crc:08x}"),
                actual: format!("{toc_crc32:08x}"),
                chunk_index: -1,
            });
        }

        let mut toc_reader = ByteReader::new(toc_bytes);
        let mut toc = Vec::with_capacity(entry_count.max(0) as usize);
        for _ in 0..entry_count {
            toc.push(TocEntry::read(&mut toc_reader)?);
        }

        Ok(Self {
            version,
            toc_offset,
            entry_count,
            total_original_size,
            total_stored_size,
            file_size,
            toc,
        })
    }

    /// Streaming variant: reads the fixed 64-byte header first to learn
    /// `entry_count`, then reads exactly that many TOC entries.
    pub fn read_from<R: std::io::Read>(source: &mut R) -> Result<Self> {
        let mut header = [0u8; TRAILER_HEADER_SIZE];
        source.read_exact(&mut header)?;
        let entry_count = i64::from_le_bytes(header[24..32].try_into().unwrap());
        check_range("entry_count", entry_count, 0, MAX_ENTRY_COUNT)?;
        let toc_size = entry_count * TOC_ENTRY_SIZE as i64;
        let mut buf = header.to_vec();
        let mut toc_bytes = vec![0u8; toc_size as usize];
        source.read_exact(&mut toc_bytes)?;
        buf.extend_from_slice(&toc_bytes);
        Self::read(&buf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamTrailer {
    pub original_size: i64,
    pub stored_size: i64,
    pub chunk_count: i32,
}

impl StreamTrailer {
    pub fn write(&self) -> [u8; STREAM_TRAILER_SIZE] {
        let mut w = ByteWriter::with_capacity(STREAM_TRAILER_SIZE);
        w.write_bytes(STREAM_TRAILER_MAGIC);
        // 4 reserved bytes: written as zero, never validated on read — the
        // second Open Question in spec.md §9.
        w.write_bytes(&[0u8; 4]);
        w.write_i64(self.original_size);
        w.write_i64(self.stored_size);
        w.write_i32(self.chunk_count);
        let trailer_crc32 = crc32fast::hash(&w.as_slice()[0..24]) as i32;
        w.write_i32(trailer_crc32);
        let v = w.into_vec();
        let mut out = [0u8; STREAM_TRAILER_SIZE];
        out.copy_from_slice(&v);
        out
    }

    pub fn read(buf: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(buf);
        let magic = r.read_bytes(4)?;
        if magic != STREAM_TRAILER_MAGIC {
            return Err(ApackError::InvalidFormat {
                offset: 0,
                expected: STREAM_TRAILER_MAGIC,
                found: magic.to_vec(),
            });
        }
        r.skip(4)?; // reserved, not validated
        let original_size = r.read_i64()?;
        let stored_size = r.read_i64()?;
        let chunk_count = r.read_i32()?;
        let trailer_crc32 = r.read_i32()?;
        let computed = crc32fast::hash(&buf[0..24]) as i32;
        if computed != trailer_crc32 {
            return Err(ApackError::ChecksumMismatch {
                expected: format!("{computed:08x}"),
                actual: format!("{trailer_crc32:08x}"),
                chunk_index: -1,
            });
        }
        Ok(Self {
            original_size,
            stored_size,
            chunk_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailer_round_trips_with_empty_toc() {
        let t = Trailer::new(0, 0, 0, 128, vec![]);
        let bytes = t.write();
        assert_eq!(bytes.len(), TRAILER_HEADER_SIZE);
        let back = Trailer::read(&bytes).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn trailer_round_trips_with_toc_entries() {
        let toc = vec![TocEntry {
            entry_id: 0,
            entry_offset: 64,
            original_size: 13,
            stored_size: 13,
            name_hash: 0x1234,
            header_crc32: 0x5678,
        }];
        let t = Trailer::new(1, 13, 13, 64 + 64 + TOC_ENTRY_SIZE as i64, toc.clone());
        let bytes = t.write();
        let back = Trailer::read(&bytes).unwrap();
        assert_eq!(back.toc, toc);
    }

    #[test]
    fn stream_trailer_round_trips() {
        let st = StreamTrailer {
            original_size: 10,
            stored_size: 8,
            chunk_count: 1,
        };
        let bytes = st.write();
        assert_eq!(bytes.len(), STREAM_TRAILER_SIZE);
        assert_eq!(StreamTrailer::read(&bytes).unwrap(), st);
    }
}
