// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Encryption of sensitive employee fields at rest.
//!
//! Values are sealed with AES-256-GCM under a 32-byte key and stored as
//! hex text: `nonce (12) || ciphertext || tag`. Every seal draws a fresh
//! random nonce, so sealing the same value twice yields different text.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use missions_domain::SocialSecurityNumber;
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_LEN: usize = 12;

/// Field encryption errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldEncryptionError {
    /// The configured key is not valid hex.
    #[error("Invalid field key hex: {0}")]
    InvalidKeyHex(String),

    /// The configured key has the wrong length.
    #[error("Field key must be 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Seal(String),

    /// Decryption failed (wrong key or corrupted data).
    #[error("Decryption failed: {0}")]
    Open(String),
}

/// Parses a hex-encoded 32-byte key (64 hex chars).
///
/// # Errors
///
/// Returns an error if the text is not hex or does not decode to 32 bytes.
pub fn parse_field_key(hex_str: &str) -> Result<[u8; 32], FieldEncryptionError> {
    let bytes: Vec<u8> = hex::decode(hex_str.trim())
        .map_err(|e| FieldEncryptionError::InvalidKeyHex(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| FieldEncryptionError::InvalidKeyLength(v.len()))
}

/// Derives a deterministic development key.
///
/// Data sealed under this key is only as safe as this source file.
#[must_use]
pub fn dev_field_key() -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"missions-dev-field-key-not-for-production");
    let digest = hasher.finalize();
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}

/// Seals and opens sensitive field values.
#[derive(Clone)]
pub struct FieldCipher {
    key: [u8; 32],
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldCipher(..)")
    }
}

impl FieldCipher {
    /// Creates a cipher over the given key.
    #[must_use]
    pub const fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    fn cipher(&self) -> Result<Aes256Gcm, FieldEncryptionError> {
        Aes256Gcm::new_from_slice(&self.key).map_err(|e| FieldEncryptionError::Seal(e.to_string()))
    }

    /// Encrypts a value and returns it as hex text.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails.
    pub fn seal(&self, plaintext: &str) -> Result<String, FieldEncryptionError> {
        let cipher: Aes256Gcm = self.cipher()?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext: Vec<u8> = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| FieldEncryptionError::Seal(e.to_string()))?;

        let mut sealed: Vec<u8> = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(hex::encode(sealed))
    }

    /// Decrypts hex text produced by [`FieldCipher::seal`].
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed, was sealed under another
    /// key, or has been tampered with.
    pub fn open(&self, sealed: &str) -> Result<String, FieldEncryptionError> {
        let bytes: Vec<u8> =
            hex::decode(sealed).map_err(|e| FieldEncryptionError::Open(e.to_string()))?;
        if bytes.len() < NONCE_LEN {
            return Err(FieldEncryptionError::Open(String::from(
                "sealed value too short",
            )));
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext: Vec<u8> = self
            .cipher()?
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| FieldEncryptionError::Open(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| FieldEncryptionError::Open(e.to_string()))
    }

    /// Seals a social security number.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails.
    pub fn seal_ssn(&self, ssn: &SocialSecurityNumber) -> Result<String, FieldEncryptionError> {
        self.seal(ssn.digits())
    }

    /// Opens a sealed social security number and returns its masked form.
    ///
    /// # Errors
    ///
    /// Returns an error if decryption fails or the plaintext is not a
    /// valid number.
    pub fn masked_ssn(&self, sealed: &str) -> Result<String, FieldEncryptionError> {
        let digits: String = self.open(sealed)?;
        SocialSecurityNumber::parse(&digits)
            .map(|ssn| ssn.masked())
            .map_err(|e| FieldEncryptionError::Open(e.to_string()))
    }
}
