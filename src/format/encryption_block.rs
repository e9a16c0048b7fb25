//! EncryptionBlock: the opaque key-wrap transport, present iff
//! `MODE_ENCRYPTED` is set. The codec only carries the wrapped key, salt,
//! and KDF parameters — deriving a content key from a password is an
//! external collaborator's job (Argon2id/PBKDF2 are out of scope here).

use crate::error::{ApackError, Result};
use crate::format::constants::*;
use crate::primitives::{check_range, ByteReader, ByteWriter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionBlock {
    pub kdf_id: u8,
    pub cipher_id: u8,
    /// Not part of spec.md's wire layout verbatim: resolves the Open
    /// Question in spec.md §9 by replacing the length-guessing heuristic
    /// with an explicit tag. `0` means "trailing 16-byte AEAD tag, no
    /// embedded ICV" — the only wrap kind this implementation produces.
    pub wrap_algorithm_id: u8,
    pub kdf_iterations: i32,
    pub kdf_memory_kb: i32,
    pub kdf_parallelism: i32,
    pub salt: Vec<u8>,
    pub wrapped_key_with_tag: Vec<u8>,
}

impl EncryptionBlock {
    pub fn new(
        kdf_id: u8,
        cipher_id: u8,
        kdf_iterations: i32,
        kdf_memory_kb: i32,
        kdf_parallelism: i32,
        salt: Vec<u8>,
        wrapped_key_with_tag: Vec<u8>,
    ) -> Self {
        Self {
            kdf_id,
            cipher_id,
            wrap_algorithm_id: 0,
            kdf_iterations,
            kdf_memory_kb,
            kdf_parallelism,
            salt,
            wrapped_key_with_tag,
        }
    }

    /// Size of the unpadded record, before 8-byte alignment padding.
    pub fn unpadded_len(&self) -> usize {
        4 + 1 + 1 + 1 + 1 + 4 + 4 + 4 + 2 + 2 + self.salt.len() + self.wrapped_key_with_tag.len()
    }

    pub fn write(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(self.unpadded_len() + 8);
        w.write_bytes(ENCRYPTION_BLOCK_MAGIC);
        w.write_u8(self.kdf_id);
        w.write_u8(self.cipher_id);
        // `reserved (2)` in spec.md §3 — one byte repurposed per the Open
        // Question decision in DESIGN.md, the other stays reserved/zero.
        w.write_u8(self.wrap_algorithm_id);
        w.write_u8(0);
        w.write_i32(self.kdf_iterations);
        w.write_i32(self.kdf_memory_kb);
        w.write_i32(self.kdf_parallelism);
        w.write_u16(self.salt.len() as u16);
        w.write_u16(self.wrapped_key_with_tag.len() as u16);
        w.write_bytes(&self.salt);
        w.write_bytes(&self.wrapped_key_with_tag);
        w.pad_to_alignment(ENTRY_ALIGNMENT);
        w.into_vec()
    }

    pub fn read(buf: &[u8]) -> Result<(Self, usize)> {
        let mut r = ByteReader::new(buf);
        let magic = r.read_bytes(4)?;
        if magic != ENCRYPTION_BLOCK_MAGIC {
            return Err(ApackError::InvalidFormat {
                offset: 0,
                expected: ENCRYPTION_BLOCK_MAGIC,
                found: magic.to_vec(),
            });
        }
        let kdf_id = r.read_u8()?;
        let cipher_id = r.read_u8()?;
        let wrap_algorithm_id = r.read_u8()?;
        let _reserved = r.read_u8()?;
        let kdf_iterations = r.read_i32()?;
        let kdf_memory_kb = r.read_i32()?;
        let kdf_parallelism = r.read_i32()?;
        let salt_len = r.read_u16()?;
        check_range("salt_len", salt_len as i64, 0, MAX_SALT_LEN as i64)?;
        let wrapped_key_total_len = r.read_u16()?;
        check_range(
            "wrapped_key_total_len",
            wrapped_key_total_len as i64,
            MIN_WRAPPED_KEY_LEN as i64,
            u16::MAX as i64,
        )?;
        let salt = r.read_bytes(salt_len as usize)?.to_vec();
        let wrapped_key_with_tag = r.read_bytes(wrapped_key_total_len as usize)?.to_vec();
        let unpadded = r.position();
        let aligned = (unpadded + ENTRY_ALIGNMENT - 1) & !(ENTRY_ALIGNMENT - 1);
        Ok((
            Self {
                kdf_id,
                cipher_id,
                wrap_algorithm_id,
                kdf_iterations,
                kdf_memory_kb,
                kdf_parallelism,
                salt,
                wrapped_key_with_tag,
            },
            aligned,
        ))
    }

    /// Streaming variant for callers that only have a `Read` source
    /// positioned right after the FileHeader (no prior knowledge of the
    /// block's total length).
    pub fn read_from<R: std::io::Read>(source: &mut R) -> Result<Self> {
        let mut prefix = [0u8; 24];
        source.read_exact(&mut prefix)?;
        let mut r = ByteReader::new(&prefix);
        let magic = r.read_bytes(4)?;
        if magic != ENCRYPTION_BLOCK_MAGIC {
            return Err(ApackError::InvalidFormat {
                offset: 0,
                expected: ENCRYPTION_BLOCK_MAGIC,
                found: magic.to_vec(),
            });
        }
        let kdf_id = r.read_u8()?;
        let cipher_id = r.read_u8()?;
        let wrap_algorithm_id = r.read_u8()?;
        let _reserved = r.read_u8()?;
        let kdf_iterations = r.read_i32()?;
        let kdf_memory_kb = r.read_i32()?;
        let kdf_parallelism = r.read_i32()?;
        let salt_len = r.read_u16()?;
        check_range("salt_len", salt_len as i64, 0, MAX_SALT_LEN as i64)?;
        let wrapped_key_total_len = r.read_u16()?;
        check_range(
            "wrapped_key_total_len",
            wrapped_key_total_len as i64,
            MIN_WRAPPED_KEY_LEN as i64,
            u16::MAX as i64,
        )?;

        let mut rest = vec![0u8; salt_len as usize + wrapped_key_total_len as usize];
        source.read_exact(&mut rest)?;
        let salt = rest[0..salt_len as usize].to_vec();
        let wrapped_key_with_tag = rest[salt_len as usize..].to_vec();

        let unpadded = 24 + rest.len();
        let aligned = (unpadded + ENTRY_ALIGNMENT - 1) & !(ENTRY_ALIGNMENT - 1);
        let pad_len = aligned - unpadded;
        if pad_len > 0 {
            let mut pad = vec![0u8; pad_len];
            source.read_exact(&mut pad)?;
        }

        Ok(Self {
            kdf_id,
            cipher_id,
            wrap_algorithm_id,
            kdf_iterations,
            kdf_memory_kb,
            kdf_parallelism,
            salt,
            wrapped_key_with_tag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_with_padding() {
        let block = EncryptionBlock::new(
            KDF_ARGON2ID,
            ENCRYPTION_AES_256_GCM as u8,
            3,
            65536,
            1,
            vec![0xAA; 32],
            vec![0xBB; 48],
        );
        let bytes = block.write();
        assert_eq!(bytes.len() % ENTRY_ALIGNMENT, 0);
        let (back, consumed) = EncryptionBlock::read(&bytes).unwrap();
        assert_eq!(back, block);
        assert_eq!(consumed, bytes.len());
    }
}
