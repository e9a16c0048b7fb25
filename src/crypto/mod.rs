//! Encryption providers: AES-256-GCM and ChaCha20-Poly1305 AEAD behind a
//! common capability interface, 12-byte nonce + 16-byte tag, optional AAD.
//!
//! Grounded on the teacher's `crypto::encrypt`/`crypto::decrypt`
//! (`Aes256Gcm::generate_nonce` + nonce-prepended-to-ciphertext layout),
//! generalized into a trait with a second implementation. ChaCha20-Poly1305
//! is new relative to the teacher and is grounded on the `chacha20poly1305`
//! crate as used alongside `aes-gcm` in the pack's vault/pipeline repos, and
//! on the `aead`-crate nonce-generation pattern shown in the pack's
//! streaming-cipher reference file. Argon2id/PBKDF2 password-to-key
//! derivation is explicitly out of scope (spec.md §1) and is not carried
//! here — callers supply a raw content key.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng as AeadOsRng, Payload};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::ChaCha20Poly1305;
use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;

use crate::error::{ApackError, Result};
use crate::format::constants::{
    AEAD_NONCE_LEN, AEAD_TAG_LEN, ENCRYPTION_AES_256_GCM, ENCRYPTION_CHACHA20_POLY1305,
    ENCRYPTION_NONE, SYMMETRIC_KEY_LEN,
};

pub trait AeadCipher: Send + Sync {
    fn id(&self) -> i32;
    fn name(&self) -> &'static str;
    fn key_size(&self) -> usize;
    fn encrypt(&self, plaintext: &[u8], key: &[u8], aad: Option<&[u8]>) -> Result<Vec<u8>>;
    fn decrypt(&self, ciphertext: &[u8], key: &[u8], aad: Option<&[u8]>) -> Result<Vec<u8>>;
}

struct NoneCipher;

impl AeadCipher for NoneCipher {
    fn id(&self) -> i32 {
        ENCRYPTION_NONE
    }
    fn name(&self) -> &'static str {
        "none"
    }
    fn key_size(&self) -> usize {
        0
    }
    fn encrypt(&self, plaintext: &[u8], _key: &[u8], _aad: Option<&[u8]>) -> Result<Vec<u8>> {
        Ok(plaintext.to_vec())
    }
    fn decrypt(&self, ciphertext: &[u8], _key: &[u8], _aad: Option<&[u8]>) -> Result<Vec<u8>> {
        Ok(ciphertext.to_vec())
    }
}

fn check_key_len(key: &[u8]) -> Result<()> {
    if key.len() != SYMMETRIC_KEY_LEN {
        return Err(ApackError::OutOfBounds {
            field: "key_len",
            value: key.len() as i64,
            min: SYMMETRIC_KEY_LEN as i64,
            max: SYMMETRIC_KEY_LEN as i64,
        });
    }
    Ok(())
}

struct Aes256GcmCipher;

impl AeadCipher for Aes256GcmCipher {
    fn id(&self) -> i32 {
        ENCRYPTION_AES_256_GCM
    }
    fn name(&self) -> &'static str {
        "aes-256-gcm"
    }
    fn key_size(&self) -> usize {
        SYMMETRIC_KEY_LEN
    }
    fn encrypt(&self, plaintext: &[u8], key: &[u8], aad: Option<&[u8]>) -> Result<Vec<u8>> {
        check_key_len(key)?;
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| ApackError::Integrity { algorithm: "aes-256-gcm" })?;
        let nonce = Aes256Gcm::generate_nonce(&mut AeadOsRng);
        let payload = Payload {
            msg: plaintext,
            aad: aad.unwrap_or(&[]),
        };
        let ciphertext = cipher
            .encrypt(&nonce, payload)
            .map_err(|_| ApackError::Integrity { algorithm: "aes-256-gcm" })?;
        let mut out = Vec::with_capacity(AEAD_NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }
    fn decrypt(&self, ciphertext: &[u8], key: &[u8], aad: Option<&[u8]>) -> Result<Vec<u8>> {
        check_key_len(key)?;
        if ciphertext.len() < AEAD_NONCE_LEN + AEAD_TAG_LEN {
            return Err(ApackError::TruncatedInput {
                expected: (AEAD_NONCE_LEN + AEAD_TAG_LEN) as u64,
                remaining: ciphertext.len() as u64,
            });
        }
        let (nonce, body) = ciphertext.split_at(AEAD_NONCE_LEN);
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| ApackError::Integrity { algorithm: "aes-256-gcm" })?;
        let payload = Payload {
            msg: body,
            aad: aad.unwrap_or(&[]),
        };
        cipher
            .decrypt(nonce.into(), payload)
            .map_err(|_| ApackError::Integrity { algorithm: "aes-256-gcm" })
    }
}

struct ChaCha20Poly1305Cipher;

impl AeadCipher for ChaCha20Poly1305Cipher {
    fn id(&self) -> i32 {
        ENCRYPTION_CHACHA20_POLY1305
    }
    fn name(&self) -> &'static str {
        "chacha20-poly1305"
    }
    fn key_size(&self) -> usize {
        SYMMETRIC_KEY_LEN
    }
    fn encrypt(&self, plaintext: &[u8], key: &[u8], aad: Option<&[u8]>) -> Result<Vec<u8>> {
        check_key_len(key)?;
        let cipher = ChaCha20Poly1305::new_from_slice(key)
            .map_err(|_| ApackError::Integrity { algorithm: "chacha20-poly1305" })?;
        let nonce = ChaCha20Poly1305::generate_nonce(&mut AeadOsRng);
        let payload = Payload {
            msg: plaintext,
            aad: aad.unwrap_or(&[]),
        };
        let ciphertext = cipher
            .encrypt(&nonce, payload)
            .map_err(|_| ApackError::Integrity { algorithm: "chacha20-poly1305" })?;
        let mut out = Vec::with_capacity(AEAD_NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }
    fn decrypt(&self, ciphertext: &[u8], key: &[u8], aad: Option<&[u8]>) -> Result<Vec<u8>> {
        check_key_len(key)?;
        if ciphertext.len() < AEAD_NONCE_LEN + AEAD_TAG_LEN {
            return Err(ApackError::TruncatedInput {
                expected: (AEAD_NONCE_LEN + AEAD_TAG_LEN) as u64,
                remaining: ciphertext.len() as u64,
            });
        }
        let (nonce, body) = ciphertext.split_at(AEAD_NONCE_LEN);
        let cipher = ChaCha20Poly1305::new_from_slice(key)
            .map_err(|_| ApackError::Integrity { algorithm: "chacha20-poly1305" })?;
        let payload = Payload {
            msg: body,
            aad: aad.unwrap_or(&[]),
        };
        cipher
            .decrypt(nonce.into(), payload)
            .map_err(|_| ApackError::Integrity { algorithm: "chacha20-poly1305" })
    }
}

type Registry = RwLock<HashMap<i32, &'static (dyn AeadCipher + Sync)>>;

static NONE: NoneCipher = NoneCipher;
static AES_GCM: Aes256GcmCipher = Aes256GcmCipher;
static CHACHA: ChaCha20Poly1305Cipher = ChaCha20Poly1305Cipher;

static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut m: HashMap<i32, &'static (dyn AeadCipher + Sync)> = HashMap::new();
    m.insert(NONE.id(), &NONE);
    m.insert(AES_GCM.id(), &AES_GCM);
    m.insert(CHACHA.id(), &CHACHA);
    RwLock::new(m)
});

pub fn get_by_id(id: i32) -> Result<&'static (dyn AeadCipher + Sync)> {
    REGISTRY
        .read()
        .unwrap()
        .get(&id)
        .copied()
        .ok_or_else(|| ApackError::Unsupported(format!("encryption algorithm id {id}")))
}

pub fn get_by_name(name: &str) -> Result<&'static (dyn AeadCipher + Sync)> {
    let lower = name.to_ascii_lowercase();
    REGISTRY
        .read()
        .unwrap()
        .values()
        .find(|c| c.name() == lower)
        .copied()
        .ok_or_else(|| ApackError::Unsupported(format!("encryption algorithm {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aes_gcm_round_trips() {
        let cipher = get_by_id(ENCRYPTION_AES_256_GCM).unwrap();
        let key = [7u8; SYMMETRIC_KEY_LEN];
        let ct = cipher.encrypt(b"secret bytes", &key, None).unwrap();
        let pt = cipher.decrypt(&ct, &key, None).unwrap();
        assert_eq!(pt, b"secret bytes");
    }

    #[test]
    fn chacha20_poly1305_round_trips_with_aad() {
        let cipher = get_by_id(ENCRYPTION_CHACHA20_POLY1305).unwrap();
        let key = [9u8; SYMMETRIC_KEY_LEN];
        let aad = b"entry-3";
        let ct = cipher.encrypt(b"payload", &key, Some(aad)).unwrap();
        let pt = cipher.decrypt(&ct, &key, Some(aad)).unwrap();
        assert_eq!(pt, b"payload");
    }

    #[test]
    fn tampered_ciphertext_fails_integrity() {
        let cipher = get_by_id(ENCRYPTION_AES_256_GCM).unwrap();
        let key = [1u8; SYMMETRIC_KEY_LEN];
        let mut ct = cipher.encrypt(b"data", &key, None).unwrap();
        let last = ct.len() - 1;
        ct[last] ^= 0xFF;
        let err = cipher.decrypt(&ct, &key, None).unwrap_err();
        assert!(matches!(err, ApackError::Integrity { .. }));
    }

    #[test]
    fn wrong_key_size_is_out_of_bounds() {
        let cipher = get_by_id(ENCRYPTION_AES_256_GCM).unwrap();
        let err = cipher.encrypt(b"data", &[0u8; 16], None).unwrap_err();
        assert!(matches!(err, ApackError::OutOfBounds { .. }));
    }
}
