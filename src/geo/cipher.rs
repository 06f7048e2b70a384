// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Payload encryption for secure geo records.
//!
//! AES-256-GCM with a fresh 96-bit nonce per call. The stored form is
//! `<nonce-hex>:<ciphertext-and-tag-hex>`.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use serde_json::Value;

/// Required key length in bytes.
pub const KEY_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("encryption key must be {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("failed to generate nonce")]
    NonceGeneration,

    #[error("failed to seal payload")]
    Seal,

    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Symmetric codec keyed by the server secret.
pub struct PayloadCipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl std::fmt::Debug for PayloadCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl PayloadCipher {
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != KEY_LEN {
            return Err(CipherError::InvalidKeyLength(key.len()));
        }
        let unbound =
            UnboundKey::new(&AES_256_GCM, key).map_err(|_| CipherError::InvalidKeyLength(key.len()))?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    /// Serialize and encrypt a JSON value.
    pub fn encrypt(&self, value: &Value) -> Result<String, CipherError> {
        let plaintext = serde_json::to_vec(value)?;
        self.encrypt_bytes(&plaintext)
    }

    /// Encrypt already-serialized bytes.
    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CipherError::NonceGeneration)?;

        let mut in_out = plaintext.to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| CipherError::Seal)?;

        Ok(format!("{}:{}", hex::encode(nonce_bytes), hex::encode(in_out)))
    }

    /// Decrypt and deserialize. `None` means the payload is unavailable:
    /// malformed, tampered with, or sealed under another key.
    pub fn decrypt(&self, text: &str) -> Option<Value> {
        let plaintext = self.decrypt_bytes(text)?;
        serde_json::from_slice(&plaintext).ok()
    }

    /// Decrypt to the raw serialized bytes.
    pub fn decrypt_bytes(&self, text: &str) -> Option<Vec<u8>> {
        let (nonce_hex, body_hex) = text.split_once(':')?;
        let nonce_bytes: [u8; NONCE_LEN] = hex::decode(nonce_hex).ok()?.try_into().ok()?;
        let mut in_out = hex::decode(body_hex).ok()?;

        let plaintext = self
            .key
            .open_in_place(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .ok()?;
        Some(plaintext.to_vec())
    }
}
