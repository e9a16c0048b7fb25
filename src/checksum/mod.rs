//! Checksum providers: CRC-32 and XXH3-64 behind a common capability
//! interface, registered by both numeric ID and case-insensitive name.
//!
//! Grounded on the teacher's `crc32fast::Hasher` usage in
//! `superblock.rs`/`block.rs` (whole-buffer `hash()` for headers); XXH3-64
//! is the crate's default per spec.md §4.2 and is new relative to the
//! teacher, which only had BLAKE3 content hashing, not a wire checksum.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;

use crate::error::{ApackError, Result};
use crate::format::constants::{CHECKSUM_CRC32, CHECKSUM_XXH3_64};

/// A streaming or one-shot checksum algorithm. Implementations are stateless
/// after construction — `create()` hands back a fresh streaming calculator
/// per use, matching the "owned by one chunk at a time" resource model.
pub trait ChecksumAlgorithm: Send + Sync {
    fn id(&self) -> u8;
    fn name(&self) -> &'static str;
    /// Width of the full (non-truncated) digest, in bytes.
    fn output_size(&self) -> usize;
    fn compute(&self, bytes: &[u8]) -> u64;
    fn create(&self) -> Box<dyn StreamingChecksum>;
}

pub trait StreamingChecksum: Send {
    fn update(&mut self, bytes: &[u8]);
    fn value(&self) -> u64;
    fn reset(&mut self);
}

struct Crc32Algorithm;

struct Crc32Stream(crc32fast::Hasher);

impl StreamingChecksum for Crc32Stream {
    fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }
    fn value(&self) -> u64 {
        self.0.clone().finalize() as u64
    }
    fn reset(&mut self) {
        self.0 = crc32fast::Hasher::new();
    }
}

impl ChecksumAlgorithm for Crc32Algorithm {
    fn id(&self) -> u8 {
        CHECKSUM_CRC32
    }
    fn name(&self) -> &'static str {
        "crc32"
    }
    fn output_size(&self) -> usize {
        4
    }
    fn compute(&self, bytes: &[u8]) -> u64 {
        crc32fast::hash(bytes) as u64
    }
    fn create(&self) -> Box<dyn StreamingChecksum> {
        Box::new(Crc32Stream(crc32fast::Hasher::new()))
    }
}

struct Xxh3_64Algorithm;

struct Xxh3_64Stream(xxhash_rust::xxh3::Xxh3);

impl StreamingChecksum for Xxh3_64Stream {
    fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }
    fn value(&self) -> u64 {
        self.0.digest()
    }
    fn reset(&mut self) {
        self.0.reset();
    }
}

impl ChecksumAlgorithm for Xxh3_64Algorithm {
    fn id(&self) -> u8 {
        CHECKSUM_XXH3_64
    }
    fn name(&self) -> &'static str {
        "xxh3-64"
    }
    fn output_size(&self) -> usize {
        8
    }
    fn compute(&self, bytes: &[u8]) -> u64 {
        xxhash_rust::xxh3::xxh3_64(bytes)
    }
    fn create(&self) -> Box<dyn StreamingChecksum> {
        Box::new(Xxh3_64Stream(xxhash_rust::xxh3::Xxh3::new()))
    }
}

// CHECKSUM_XXH3_128 (spec.md §4.2/§6) is reserved and deliberately left
// unregistered: get_by_id/get_by_name must fail with Unsupported rather than
// silently accept it, since there is no real implementation behind it.

type Registry = RwLock<HashMap<u8, &'static (dyn ChecksumAlgorithm + Sync)>>;

static CRC32: Crc32Algorithm = Crc32Algorithm;
static XXH3_64: Xxh3_64Algorithm = Xxh3_64Algorithm;

static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut m: HashMap<u8, &'static (dyn ChecksumAlgorithm + Sync)> = HashMap::new();
    m.insert(CRC32.id(), &CRC32);
    m.insert(XXH3_64.id(), &XXH3_64);
    RwLock::new(m)
});

pub const DEFAULT_CHECKSUM_ALGO_ID: u8 = CHECKSUM_XXH3_64;

pub fn get_by_id(id: u8) -> Result<&'static (dyn ChecksumAlgorithm + Sync)> {
    REGISTRY
        .read()
        .unwrap()
        .get(&id)
        .copied()
        .ok_or_else(|| ApackError::Unsupported(format!("checksum algorithm id {id}")))
}

pub fn get_by_name(name: &str) -> Result<&'static (dyn ChecksumAlgorithm + Sync)> {
    let lower = name.to_ascii_lowercase();
    REGISTRY
        .read()
        .unwrap()
        .values()
        .find(|algo| algo.name() == lower)
        .copied()
        .ok_or_else(|| ApackError::Unsupported(format!("checksum algorithm {name}")))
}

/// Lower 32 bits of a (possibly wider) checksum result, as stored in a
/// ChunkHeader's 32-bit checksum field.
pub fn truncate_to_chunk_field(value: u64) -> i32 {
    (value as u32) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_and_xxh3_are_registered_and_distinct() {
        let crc = get_by_id(CHECKSUM_CRC32).unwrap();
        let xxh3 = get_by_id(CHECKSUM_XXH3_64).unwrap();
        assert_ne!(crc.compute(b"hello"), xxh3.compute(b"hello"));
    }

    #[test]
    fn lookup_by_name_is_case_insensitive() {
        assert_eq!(get_by_name("XXH3-64").unwrap().id(), CHECKSUM_XXH3_64);
    }

    #[test]
    fn streaming_matches_one_shot() {
        let algo = get_by_id(CHECKSUM_XXH3_64).unwrap();
        let mut stream = algo.create();
        stream.update(b"hel");
        stream.update(b"lo");
        assert_eq!(stream.value(), algo.compute(b"hello"));
    }

    #[test]
    fn unknown_id_is_unsupported() {
        assert!(get_by_id(200).is_err());
    }

    #[test]
    fn reserved_xxh3_128_is_unsupported() {
        assert!(get_by_id(crate::format::constants::CHECKSUM_XXH3_128).is_err());
    }
}
