//! Magic bytes, numeric algorithm IDs, flag bits, and size constants. All
//! fixed by the wire format; nothing here is negotiated at runtime.

pub const FILE_MAGIC: &[u8; 6] = b"APACK\0";
pub const ENCRYPTION_BLOCK_MAGIC: &[u8; 4] = b"ENCR";
pub const ENTRY_MAGIC: &[u8; 4] = b"ENTR";
pub const CHUNK_MAGIC: &[u8; 4] = b"CHNK";
pub const TRAILER_MAGIC: &[u8; 4] = b"ATRL";
pub const STREAM_TRAILER_MAGIC: &[u8; 4] = b"STRL";

pub const FILE_HEADER_SIZE: usize = 64;
pub const ENTRY_HEADER_MIN_SIZE: usize = 56;
pub const CHUNK_HEADER_SIZE: usize = 24;
pub const TOC_ENTRY_SIZE: usize = 40;
pub const STREAM_TRAILER_SIZE: usize = 32;
pub const ENTRY_ALIGNMENT: usize = 8;

pub const CURRENT_VERSION_MAJOR: u16 = 1;
pub const CURRENT_VERSION_MINOR: u16 = 0;
pub const CURRENT_VERSION_PATCH: u16 = 0;
pub const CURRENT_COMPAT_LEVEL: u16 = 1;

// File header mode flags.
pub const MODE_STREAM: u8 = 0x01;
pub const MODE_ENCRYPTED: u8 = 0x02;
pub const MODE_COMPRESSED: u8 = 0x04;
pub const MODE_RANDOM_ACCESS: u8 = 0x08;

// Entry header flags.
pub const ENTRY_FLAG_HAS_ATTRIBUTES: u16 = 0x01;
pub const ENTRY_FLAG_COMPRESSED: u16 = 0x02;
pub const ENTRY_FLAG_ENCRYPTED: u16 = 0x04;
pub const ENTRY_FLAG_HAS_ECC: u16 = 0x08;

// Chunk header flags.
pub const CHUNK_FLAG_LAST: i32 = 0x01;
pub const CHUNK_FLAG_COMPRESSED: i32 = 0x02;
pub const CHUNK_FLAG_ENCRYPTED: i32 = 0x04;

// Attribute value types.
pub const ATTR_TYPE_STRING: u8 = 0;
pub const ATTR_TYPE_INT64: u8 = 1;
pub const ATTR_TYPE_FLOAT64: u8 = 2;
pub const ATTR_TYPE_BOOLEAN: u8 = 3;
pub const ATTR_TYPE_BYTES: u8 = 4;

// Algorithm IDs (fixed by the wire format).
pub const CHECKSUM_CRC32: u8 = 0;
pub const CHECKSUM_XXH3_64: u8 = 1;
pub const CHECKSUM_XXH3_128: u8 = 2;

pub const COMPRESSION_NONE: i32 = 0;
pub const COMPRESSION_ZSTD: i32 = 1;
pub const COMPRESSION_LZ4: i32 = 2;

pub const ENCRYPTION_NONE: i32 = 0;
pub const ENCRYPTION_AES_256_GCM: i32 = 1;
pub const ENCRYPTION_CHACHA20_POLY1305: i32 = 2;

pub const KDF_ARGON2ID: u8 = 0;
pub const KDF_PBKDF2_SHA256: u8 = 1;

pub const AEAD_NONCE_LEN: usize = 12;
pub const AEAD_TAG_LEN: usize = 16;
pub const SYMMETRIC_KEY_LEN: usize = 32;
pub const DEFAULT_SALT_LEN: usize = 32;

// Size limits (defaults and absolute caps).
pub const MIN_CHUNK_SIZE: i64 = 1024;
pub const MAX_CHUNK_SIZE: i64 = 64 * 1024 * 1024;
pub const DEFAULT_CHUNK_SIZE: i64 = 256 * 1024;

pub const MAX_ENTRY_NAME_LEN: usize = 65_535;
pub const MAX_ENTRY_COUNT: i64 = 1_000_000;
pub const MAX_ENTRY_SIZE: i64 = 1024i64 * 1024 * 1024 * 1024; // 1 TiB

pub const DEFAULT_MAX_CHUNK_SIZE_SECURITY: i64 = 64 * 1024 * 1024;
pub const ABSOLUTE_MAX_CHUNK_SIZE_SECURITY: i64 = 256 * 1024 * 1024;

pub const DEFAULT_MAX_COMPRESSION_RATIO: i64 = 100_000;
pub const ABSOLUTE_MAX_COMPRESSION_RATIO: i64 = 1_000_000;

pub const DEFAULT_MAX_ENCRYPTION_OVERHEAD: i64 = 1024;
pub const ABSOLUTE_MAX_ENCRYPTION_OVERHEAD: i64 = 8192;

pub const MAX_SALT_LEN: u16 = 256;
pub const MIN_WRAPPED_KEY_LEN: u16 = 8;
