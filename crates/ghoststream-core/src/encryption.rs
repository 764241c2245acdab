//! Title envelope encryption
//!
//! Titles are sealed with AES-256-GCM under a fresh 96-bit nonce and stored as a
//! base64-encoded compact JSON envelope:
//!
//! ```text
//! base64({"v":1,"alg":"A256GCM","iv_b64":"...","ct_b64":"..."})
//! ```
//!
//! `ct_b64` holds the ciphertext with the 16-byte authentication tag appended.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use crate::constants::{AES_KEY_LEN, ENVELOPE_ALGORITHM, ENVELOPE_VERSION, NONCE_LEN};
use crate::error::{IngestError, IngestResult};

/// Versioned, self-describing encrypted title.
///
/// Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedTitleEnvelope {
    pub v: u8,
    pub alg: String,
    pub iv_b64: String,
    pub ct_b64: String,
}

impl EncryptedTitleEnvelope {
    /// Compact JSON, then standard base64.
    pub fn encode(&self) -> IngestResult<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| IngestError::Envelope(format!("Failed to serialize envelope: {}", e)))?;
        Ok(general_purpose::STANDARD.encode(json))
    }

    pub fn decode(encoded: &str) -> IngestResult<Self> {
        let json = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| IngestError::Envelope(format!("Envelope is not base64: {}", e)))?;
        let envelope: EncryptedTitleEnvelope = serde_json::from_slice(&json)
            .map_err(|e| IngestError::Envelope(format!("Envelope is not valid JSON: {}", e)))?;

        if envelope.v != ENVELOPE_VERSION {
            return Err(IngestError::Envelope(format!(
                "Unsupported envelope version {}",
                envelope.v
            )));
        }
        if envelope.alg != ENVELOPE_ALGORITHM {
            return Err(IngestError::Envelope(format!(
                "Unsupported envelope algorithm {}",
                envelope.alg
            )));
        }
        Ok(envelope)
    }
}

/// AES-256-GCM sealing of titles.
#[derive(Clone)]
pub struct TitleEncryptor {
    cipher: Aes256Gcm,
}

impl TitleEncryptor {
    /// Key must be exactly 32 bytes.
    pub fn from_key_bytes(key_bytes: &[u8]) -> IngestResult<Self> {
        if key_bytes.len() != AES_KEY_LEN {
            return Err(IngestError::KeyConfiguration(format!(
                "AES key must be {} bytes after base64 decoding, got {}",
                AES_KEY_LEN,
                key_bytes.len()
            )));
        }
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    pub fn from_base64(key_b64: &str) -> IngestResult<Self> {
        let key_bytes = general_purpose::STANDARD
            .decode(key_b64.trim())
            .map_err(|e| IngestError::KeyConfiguration(format!("AES key is not base64: {}", e)))?;
        Self::from_key_bytes(&key_bytes)
    }

    /// Seal a title under a fresh random nonce, no associated data.
    pub fn seal(&self, title: &str) -> IngestResult<EncryptedTitleEnvelope> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, title.as_bytes())
            .map_err(|e| IngestError::Envelope(format!("Encryption failed: {}", e)))?;

        Ok(EncryptedTitleEnvelope {
            v: ENVELOPE_VERSION,
            alg: ENVELOPE_ALGORITHM.to_string(),
            iv_b64: general_purpose::STANDARD.encode(nonce),
            ct_b64: general_purpose::STANDARD.encode(ciphertext),
        })
    }

    /// Seal a title and return the encoded envelope as stored in the catalog.
    pub fn encrypt(&self, title: &str) -> IngestResult<String> {
        self.seal(title)?.encode()
    }

    /// Recover a title from an encoded envelope.
    ///
    /// A wrong key or tampered ciphertext fails authentication.
    pub fn decrypt(&self, encoded: &str) -> IngestResult<String> {
        let envelope = EncryptedTitleEnvelope::decode(encoded)?;
        self.open(&envelope)
    }

    pub fn open(&self, envelope: &EncryptedTitleEnvelope) -> IngestResult<String> {
        let iv = general_purpose::STANDARD
            .decode(&envelope.iv_b64)
            .map_err(|e| IngestError::Envelope(format!("Nonce is not base64: {}", e)))?;
        if iv.len() != NONCE_LEN {
            return Err(IngestError::Envelope(format!(
                "Nonce must be {} bytes, got {}",
                NONCE_LEN,
                iv.len()
            )));
        }
        let ciphertext = general_purpose::STANDARD
            .decode(&envelope.ct_b64)
            .map_err(|e| IngestError::Envelope(format!("Ciphertext is not base64: {}", e)))?;

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&iv), ciphertext.as_ref())
            .map_err(|_| IngestError::Envelope("Authentication failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| IngestError::Envelope(format!("Invalid UTF-8 in decrypted title: {}", e)))
    }
}
