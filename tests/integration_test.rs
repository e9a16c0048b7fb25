use std::io::Cursor;

use apack::archive::{Archive, ArchiveConfig, ReaderOptions};
use apack::archive::reader::ArchiveReader;
use apack::archive::writer::ArchiveWriter;
use apack::format::constants::{
    COMPRESSION_NONE, COMPRESSION_ZSTD, ENCRYPTION_AES_256_GCM, SYMMETRIC_KEY_LEN,
};
use apack::format::EncryptionBlock;
use apack::error::ApackError;
use tempfile::NamedTempFile;

#[test]
fn empty_archive_is_128_bytes_on_disk() {
    let temp = NamedTempFile::new().unwrap();
    let archive = Archive::create(temp.path(), ArchiveConfig::default()).unwrap();
    archive.finalize().unwrap();
    let size = std::fs::metadata(temp.path()).unwrap().len();
    assert_eq!(size, 128);
}

#[test]
fn single_tiny_uncompressed_entry_round_trips() {
    let temp = NamedTempFile::new().unwrap();
    let config = ArchiveConfig {
        compression_algo_id: COMPRESSION_NONE,
        ..ArchiveConfig::default()
    };
    let mut archive = Archive::create(temp.path(), config).unwrap();
    archive.add_entry("hello.txt", "text/plain", vec![], &b"hi"[..]).unwrap();
    archive.finalize().unwrap();

    let mut archive = Archive::open(temp.path(), ReaderOptions::default()).unwrap();
    let data = archive.read_file("hello.txt").unwrap();
    assert_eq!(data, b"hi");
}

#[test]
fn multi_chunk_zstd_entry_round_trips() {
    let temp = NamedTempFile::new().unwrap();
    let config = ArchiveConfig {
        chunk_size: 4096,
        compression_algo_id: COMPRESSION_ZSTD,
        ..ArchiveConfig::default()
    };
    let payload = b"the quick brown fox jumps over the lazy dog ".repeat(2000);
    let mut archive = Archive::create(temp.path(), config).unwrap();
    archive.add_entry("big.txt", "text/plain", vec![], payload.as_slice()).unwrap();
    archive.finalize().unwrap();

    let mut archive = Archive::open(temp.path(), ReaderOptions::default()).unwrap();
    let data = archive.read_file("big.txt").unwrap();
    assert_eq!(data, payload);
}

#[test]
fn incompressible_chunk_falls_back_to_stored() {
    // Random-looking bytes don't compress; the writer should store them raw
    // per chunk rather than emit a larger "compressed" payload.
    let mut seed = 0x2545F4914F6CDD1Du64;
    let mut next = || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed
    };
    let payload: Vec<u8> = (0..8192).map(|_| (next() % 256) as u8).collect();

    let config = ArchiveConfig {
        chunk_size: 8192,
        compression_algo_id: COMPRESSION_ZSTD,
        ..ArchiveConfig::default()
    };
    let mut writer = ArchiveWriter::create(Cursor::new(Vec::new()), config).unwrap();
    writer.add_entry("random.bin", "application/octet-stream", vec![], payload.as_slice()).unwrap();
    let sink = writer.finalize().unwrap();

    let mut reader = ArchiveReader::open(Cursor::new(sink.into_inner()), ReaderOptions::default()).unwrap();
    let data = reader.read_by_name("random.bin").unwrap();
    assert_eq!(data, payload);
}

#[test]
fn tampered_ciphertext_is_rejected_on_read() {
    let key = vec![5u8; SYMMETRIC_KEY_LEN];
    let encryption_block = EncryptionBlock::new(0, ENCRYPTION_AES_256_GCM as u8, 0, 0, 0, Vec::new(), vec![0u8; 48]);
    let config = ArchiveConfig {
        encryption_algo_id: ENCRYPTION_AES_256_GCM,
        encryption_key: Some(key.clone()),
        encryption_block: Some(encryption_block),
        ..ArchiveConfig::default()
    };
    let mut writer = ArchiveWriter::create(Cursor::new(Vec::new()), config).unwrap();
    writer.add_entry("secret.txt", "text/plain", vec![], &b"classified"[..]).unwrap();
    let sink = writer.finalize().unwrap();
    let mut bytes = sink.into_inner();

    let mut options = ReaderOptions::default();
    options.encryption_key = Some(key.clone());

    // Locate the entry's data offset from the untampered archive, then flip
    // a byte inside its ciphertext — the file header, entry header, and
    // trailer all still parse; only AEAD decryption of the payload fails.
    let data_offset = {
        let mut reader = ArchiveReader::open(Cursor::new(bytes.clone()), options.clone()).unwrap();
        reader.get_by_name("secret.txt").unwrap().data_offset()
    };
    bytes[data_offset as usize] ^= 0xFF;

    let mut reader = ArchiveReader::open(Cursor::new(bytes), options).unwrap();
    let err = reader.read_by_name("secret.txt").unwrap_err();
    assert!(matches!(err, ApackError::Integrity { .. } | ApackError::ChecksumMismatch { .. }));
}

#[test]
fn encrypted_entry_round_trips_with_matching_aad() {
    let key = vec![9u8; SYMMETRIC_KEY_LEN];
    let aad = b"archive-context-v1".to_vec();
    let encryption_block = EncryptionBlock::new(0, ENCRYPTION_AES_256_GCM as u8, 0, 0, 0, Vec::new(), vec![0u8; 48]);
    let config = ArchiveConfig {
        encryption_algo_id: ENCRYPTION_AES_256_GCM,
        encryption_key: Some(key.clone()),
        aad: Some(aad.clone()),
        encryption_block: Some(encryption_block),
        ..ArchiveConfig::default()
    };
    let mut writer = ArchiveWriter::create(Cursor::new(Vec::new()), config).unwrap();
    writer.add_entry("secret.txt", "text/plain", vec![], &b"classified"[..]).unwrap();
    let sink = writer.finalize().unwrap();

    let mut options = ReaderOptions::default();
    options.encryption_key = Some(key);
    options.aad = Some(aad);
    let mut reader = ArchiveReader::open(Cursor::new(sink.into_inner()), options).unwrap();
    assert_eq!(reader.read_by_name("secret.txt").unwrap(), b"classified");
}

#[test]
fn random_access_by_name_resolves_hash_collisions() {
    // Different names that happen to collide on the lower 32 bits of
    // XXH3-64 would land in the same bucket; the reader must still resolve
    // the right entry by comparing full names, not just the hash.
    let mut writer = ArchiveWriter::create(Cursor::new(Vec::new()), ArchiveConfig::default()).unwrap();
    writer.add_entry("one.txt", "text/plain", vec![], &b"first"[..]).unwrap();
    writer.add_entry("two.txt", "text/plain", vec![], &b"second"[..]).unwrap();
    writer.add_entry("three.txt", "text/plain", vec![], &b"third"[..]).unwrap();
    let sink = writer.finalize().unwrap();

    let mut reader = ArchiveReader::open(Cursor::new(sink.into_inner()), ReaderOptions::default()).unwrap();
    assert_eq!(reader.read_by_name("one.txt").unwrap(), b"first");
    assert_eq!(reader.read_by_name("two.txt").unwrap(), b"second");
    assert_eq!(reader.read_by_name("three.txt").unwrap(), b"third");
    assert!(reader.read_by_name("missing.txt").is_err());
}

#[test]
fn list_then_read_by_id_matches_names() {
    let temp = NamedTempFile::new().unwrap();
    let mut archive = Archive::create(temp.path(), ArchiveConfig::default()).unwrap();
    archive.add_entry("a.txt", "text/plain", vec![], &b"aaa"[..]).unwrap();
    archive.add_entry("b.txt", "text/plain", vec![], &b"bbb"[..]).unwrap();
    archive.finalize().unwrap();

    let mut archive = Archive::open(temp.path(), ReaderOptions::default()).unwrap();
    let entries = archive.list().unwrap();
    assert_eq!(entries.len(), 2);
    for entry in &entries {
        let data = archive.read_file_by_id(entry.entry_id).unwrap();
        assert_eq!(data.len(), entry.original_size as usize);
    }
}

#[test]
fn verify_scan_reports_full_health_on_clean_archive() {
    let temp = NamedTempFile::new().unwrap();
    let mut archive = Archive::create(temp.path(), ArchiveConfig::default()).unwrap();
    archive.add_entry("a.txt", "text/plain", vec![], &b"aaa"[..]).unwrap();
    archive.finalize().unwrap();

    let report = apack::recovery::scan_file(temp.path()).unwrap();
    assert_eq!(report.healthy_entries, 1);
    assert_eq!(report.quality, apack::recovery::RecoveryQuality::Full);
}

#[test]
fn opening_missing_file_is_an_io_error() {
    let err = Archive::open("/nonexistent/path/does-not-exist.apk", ReaderOptions::default()).unwrap_err();
    assert!(matches!(err, ApackError::Io(_)));
}

