//! Index-bypass recovery scanner: reconstructs an entry list without
//! trusting the trailer, by walking entry and chunk headers forward.
//!
//! Grounded on `recovery/scanner.rs`'s forward-scan approach (the trailer
//! equivalent, the TOC, is never consulted; every entry is self-describing
//! enough to find the next one). Read-only diagnostic, not a mutator —
//! there is no `extract_recoverable` write-back here, since spec.md's
//! Non-goals exclude in-place modification and this implementation keeps
//! the scanner to reporting, exposed via the CLI's `verify` subcommand.

use std::io::{self, Read, Seek, SeekFrom};

use crate::checksum;
use crate::codec;
use crate::crypto;
use crate::format::chunk::ChunkHeader;
use crate::format::constants::{CHUNK_HEADER_SIZE, ENCRYPTION_NONE, FILE_HEADER_SIZE};
use crate::format::{EncryptionBlock, EntryHeader, FileHeader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryHealth {
    /// Entry header CRC valid, every chunk header readable through LAST.
    Healthy,
    /// Entry header magic or CRC failed.
    HeaderCorrupt,
    /// Entry header valid but the chunk stream ended before a LAST chunk.
    Truncated { chunks_read: u32 },
    /// Entry header valid, but its compression or encryption id isn't
    /// registered in this build.
    UnknownAlgorithm { compression_id: i32, encryption_id: i32 },
}

impl EntryHealth {
    pub fn is_usable(&self) -> bool {
        matches!(self, EntryHealth::Healthy)
    }
}

#[derive(Debug, Clone)]
pub struct ScannedEntry {
    pub archive_offset: u64,
    pub entry_id: Option<i64>,
    pub name: Option<String>,
    pub chunk_count: u32,
    pub original_size: u64,
    pub health: EntryHealth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryQuality {
    /// All entries healthy.
    Full,
    /// Some entries corrupt or truncated.
    Partial,
    /// Entry headers readable but no chunk data trusted.
    HeaderOnly,
    /// Fewer than half the entries are healthy.
    Catastrophic,
}

#[derive(Debug)]
pub struct RecoveryReport {
    pub total_scanned: usize,
    pub healthy_entries: usize,
    pub corrupt_entries: usize,
    pub truncated_entries: usize,
    pub unknown_algorithm_entries: usize,
    pub bytes_scanned: u64,
    pub entry_log: Vec<ScannedEntry>,
    pub recoverable_bytes: u64,
    pub quality: RecoveryQuality,
}

impl RecoveryReport {
    pub fn health_pct(&self) -> f64 {
        if self.total_scanned == 0 {
            return 100.0;
        }
        self.healthy_entries as f64 / self.total_scanned as f64 * 100.0
    }

    pub fn summary(&self) -> String {
        format!(
            "{:?} recovery: {}/{} entries healthy ({:.1}%), {:.2} MiB recoverable",
            self.quality,
            self.healthy_entries,
            self.total_scanned,
            self.health_pct(),
            self.recoverable_bytes as f64 / 1024.0 / 1024.0,
        )
    }
}

fn empty_report() -> RecoveryReport {
    RecoveryReport {
        total_scanned: 0,
        healthy_entries: 0,
        corrupt_entries: 0,
        truncated_entries: 0,
        unknown_algorithm_entries: 0,
        bytes_scanned: 0,
        entry_log: Vec::new(),
        recoverable_bytes: 0,
        quality: RecoveryQuality::Catastrophic,
    }
}

/// Scans an archive stream without trusting its trailer. Corruption is
/// encoded as `EntryHealth` in the report, not as an `Err` — only genuine
/// I/O errors propagate.
pub fn scan<R: Read + Seek>(reader: &mut R) -> io::Result<RecoveryReport> {
    reader.seek(SeekFrom::Start(0))?;
    let mut header_buf = [0u8; FILE_HEADER_SIZE];
    if reader.read_exact(&mut header_buf).is_err() {
        return Ok(empty_report());
    }
    let file_header = match FileHeader::read(&header_buf) {
        Ok(h) => h,
        Err(_) => return Ok(empty_report()),
    };

    if file_header.is_encrypted() {
        if EncryptionBlock::read_from(reader).is_err() {
            return Ok(empty_report());
        }
    }

    let mut total_scanned = 0usize;
    let mut healthy_entries = 0usize;
    let mut corrupt_entries = 0usize;
    let mut truncated_entries = 0usize;
    let mut unknown_algorithm_entries = 0usize;
    let mut recoverable_bytes = 0u64;
    let mut entry_log = Vec::new();

    loop {
        let pos = reader.stream_position()?;
        let header = match EntryHeader::read_from(reader) {
            Ok(h) => h,
            Err(e) => {
                if is_eof(&e) {
                    break;
                }
                // Magic/CRC failure: this entry is unusable and, without a
                // trailer to consult, there's no safe resync point past it.
                total_scanned += 1;
                corrupt_entries += 1;
                entry_log.push(ScannedEntry {
                    archive_offset: pos,
                    entry_id: None,
                    name: None,
                    chunk_count: 0,
                    original_size: 0,
                    health: EntryHealth::HeaderCorrupt,
                });
                break;
            }
        };
        total_scanned += 1;

        let compression_ok = header.compression_id == 0 || codec::get_by_id(header.compression_id).is_ok();
        let encryption_ok = header.encryption_id == ENCRYPTION_NONE || crypto::get_by_id(header.encryption_id).is_ok();
        let checksum_ok = checksum::get_by_id(file_header.checksum_algo_id).is_ok();

        if !compression_ok || !encryption_ok || !checksum_ok {
            unknown_algorithm_entries += 1;
            entry_log.push(ScannedEntry {
                archive_offset: pos,
                entry_id: Some(header.entry_id),
                name: Some(header.name.clone()),
                chunk_count: 0,
                original_size: 0,
                health: EntryHealth::UnknownAlgorithm {
                    compression_id: header.compression_id,
                    encryption_id: header.encryption_id,
                },
            });
            break;
        }

        let (health, chunks_read) = scan_chunks(reader)?;
        match &health {
            EntryHealth::Healthy => {
                healthy_entries += 1;
                recoverable_bytes += header.original_size.max(0) as u64;
            }
            EntryHealth::Truncated { .. } => truncated_entries += 1,
            _ => corrupt_entries += 1,
        }
        let stop = !matches!(health, EntryHealth::Healthy);
        entry_log.push(ScannedEntry {
            archive_offset: pos,
            entry_id: Some(header.entry_id),
            name: Some(header.name),
            chunk_count: chunks_read,
            original_size: header.original_size.max(0) as u64,
            health,
        });
        if stop {
            break;
        }
    }

    let bytes_scanned = reader.stream_position().unwrap_or(0);
    let quality = if total_scanned == 0 {
        RecoveryQuality::Catastrophic
    } else {
        let pct = healthy_entries as f64 / total_scanned as f64;
        if healthy_entries == 0 {
            RecoveryQuality::HeaderOnly
        } else if pct >= 0.95 {
            RecoveryQuality::Full
        } else if pct >= 0.50 {
            RecoveryQuality::Partial
        } else {
            RecoveryQuality::Catastrophic
        }
    };

    Ok(RecoveryReport {
        total_scanned,
        healthy_entries,
        corrupt_entries,
        truncated_entries,
        unknown_algorithm_entries,
        bytes_scanned,
        entry_log,
        recoverable_bytes,
        quality,
    })
}

fn is_eof(err: &crate::error::ApackError) -> bool {
    matches!(err, crate::error::ApackError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
}

/// Walks chunk headers for one entry, trusting declared `stored_size` to
/// skip payload bytes without decoding them (decoding needs a key this
/// scanner doesn't have).
fn scan_chunks<R: Read + Seek>(reader: &mut R) -> io::Result<(EntryHealth, u32)> {
    let mut count = 0u32;
    loop {
        let mut buf = [0u8; CHUNK_HEADER_SIZE];
        match reader.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Ok((EntryHealth::Truncated { chunks_read: count }, count));
            }
            Err(e) => return Err(e),
        }
        let header = match ChunkHeader::read(&buf) {
            Ok(h) => h,
            Err(_) => return Ok((EntryHealth::Truncated { chunks_read: count }, count)),
        };
        let skip = header.stored_size.max(0) as i64;
        if reader.seek(SeekFrom::Current(skip)).is_err() {
            return Ok((EntryHealth::Truncated { chunks_read: count }, count));
        }
        count += 1;
        if header.is_last() {
            return Ok((EntryHealth::Healthy, count));
        }
    }
}

pub fn scan_file(path: &std::path::Path) -> io::Result<RecoveryReport> {
    let mut f = std::fs::File::open(path)?;
    scan(&mut f)
}
