//! Envelope encryption with key rotation support, used to decrypt the HTTP
//! adapter's Authorization header and to protect Vault AppRole credentials
//! at rest. Uses AES-256-GCM with per-value DEKs wrapped by versioned KEKs.
//!
//! Adapted from `everruns-storage::encryption`, which is itself
//! domain-agnostic — reused here without change to its cryptographic core.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;
const DEK_SIZE: usize = 32;
const PAYLOAD_VERSION: u8 = 1;
const ALGORITHM: &str = "AES-256-GCM";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub version: u8,
    pub alg: String,
    pub key_id: String,
    pub dek_wrapped: String,
    pub nonce: String,
    pub ciphertext: String,
}

#[derive(Clone)]
struct VersionedKey {
    id: String,
    cipher: Aes256Gcm,
}

/// Encryption service supporting envelope encryption with key rotation.
/// Thread-safe and designed for concurrent use.
#[derive(Clone)]
pub struct EncryptionService {
    primary_key: Arc<VersionedKey>,
    keys: Arc<HashMap<String, Aes256Gcm>>,
}

impl EncryptionService {
    /// Create from versioned key strings in format "key_id:base64_key".
    /// The first key is used for new encryptions, all keys are available for decryption.
    pub fn new(primary_key: &str, previous_keys: &[&str]) -> Result<Self> {
        let (primary_id, primary_cipher) = Self::parse_versioned_key(primary_key)?;

        let mut keys = HashMap::new();
        keys.insert(primary_id.clone(), primary_cipher.clone());

        for key_str in previous_keys {
            let (id, cipher) = Self::parse_versioned_key(key_str)?;
            if keys.contains_key(&id) {
                anyhow::bail!("Duplicate key ID: {}", id);
            }
            keys.insert(id, cipher);
        }

        Ok(Self {
            primary_key: Arc::new(VersionedKey {
                id: primary_id,
                cipher: primary_cipher,
            }),
            keys: Arc::new(keys),
        })
    }

    /// Create from environment variables.
    /// - SECRETS_ENCRYPTION_KEY: Primary key (required)
    /// - SECRETS_ENCRYPTION_KEY_PREVIOUS: Previous key for rotation (optional)
    pub fn from_env() -> Result<Self> {
        let primary = std::env::var("SECRETS_ENCRYPTION_KEY")
            .context("SECRETS_ENCRYPTION_KEY environment variable not set")?;

        let previous_keys: Vec<String> = std::env::var("SECRETS_ENCRYPTION_KEY_PREVIOUS")
            .ok()
            .into_iter()
            .collect();

        let previous_refs: Vec<&str> = previous_keys.iter().map(|s| s.as_str()).collect();

        Self::new(&primary, &previous_refs)
    }

    fn parse_versioned_key(key_str: &str) -> Result<(String, Aes256Gcm)> {
        let parts: Vec<&str> = key_str.splitn(2, ':').collect();
        if parts.len() != 2 {
            anyhow::bail!(
                "Invalid key format. Expected 'key_id:base64_key', got: {}",
                if key_str.len() > 20 {
                    format!("{}...", &key_str[..20])
                } else {
                    key_str.to_string()
                }
            );
        }

        let key_id = parts[0].to_string();
        let key_bytes = BASE64
            .decode(parts[1])
            .context("Failed to decode key from base64")?;

        if key_bytes.len() != KEY_SIZE {
            anyhow::bail!(
                "Key must be {} bytes, got {} bytes for key_id '{}'",
                KEY_SIZE,
                key_bytes.len(),
                key_id
            );
        }

        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|e| anyhow::anyhow!("Failed to create cipher for key '{}': {}", key_id, e))?;

        Ok((key_id, cipher))
    }

    /// Encrypt plaintext using envelope encryption. Returns JSON-encoded EncryptedPayload.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut dek_bytes = [0u8; DEK_SIZE];
        rand::thread_rng().fill_bytes(&mut dek_bytes);

        let mut dek_nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut dek_nonce_bytes);
        let dek_nonce = Nonce::from_slice(&dek_nonce_bytes);

        let wrapped_dek = self
            .primary_key
            .cipher
            .encrypt(dek_nonce, dek_bytes.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to wrap DEK: {}", e))?;

        let dek_cipher = Aes256Gcm::new_from_slice(&dek_bytes)
            .map_err(|e| anyhow::anyhow!("Failed to create DEK cipher: {}", e))?;

        let mut data_nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut data_nonce_bytes);
        let data_nonce = Nonce::from_slice(&data_nonce_bytes);

        let ciphertext = dek_cipher
            .encrypt(data_nonce, plaintext)
            .map_err(|e| anyhow::anyhow!("Encryption failed: {}", e))?;

        let mut dek_wrapped_bytes = Vec::with_capacity(NONCE_SIZE + wrapped_dek.len());
        dek_wrapped_bytes.extend_from_slice(&dek_nonce_bytes);
        dek_wrapped_bytes.extend_from_slice(&wrapped_dek);

        let payload = EncryptedPayload {
            version: PAYLOAD_VERSION,
            alg: ALGORITHM.to_string(),
            key_id: self.primary_key.id.clone(),
            dek_wrapped: BASE64.encode(&dek_wrapped_bytes),
            nonce: BASE64.encode(data_nonce_bytes),
            ciphertext: BASE64.encode(&ciphertext),
        };

        serde_json::to_vec(&payload).context("Failed to serialize encrypted payload")
    }

    /// Decrypt data using the key referenced in the payload.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let payload: EncryptedPayload =
            serde_json::from_slice(data).context("Failed to parse encrypted payload")?;

        if payload.version != PAYLOAD_VERSION {
            anyhow::bail!(
                "Unsupported payload version: {} (expected {})",
                payload.version,
                PAYLOAD_VERSION
            );
        }

        if payload.alg != ALGORITHM {
            anyhow::bail!("Unsupported algorithm: {} (expected {})", payload.alg, ALGORITHM);
        }

        let kek_cipher = self.keys.get(&payload.key_id).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown key_id '{}'. Available keys: {:?}",
                payload.key_id,
                self.keys.keys().collect::<Vec<_>>()
            )
        })?;

        let dek_wrapped_bytes = BASE64
            .decode(&payload.dek_wrapped)
            .context("Failed to decode wrapped DEK")?;

        if dek_wrapped_bytes.len() < NONCE_SIZE {
            anyhow::bail!("Wrapped DEK too short");
        }

        let (dek_nonce_bytes, wrapped_dek) = dek_wrapped_bytes.split_at(NONCE_SIZE);
        let dek_nonce = Nonce::from_slice(dek_nonce_bytes);

        let dek_bytes = kek_cipher
            .decrypt(dek_nonce, wrapped_dek)
            .map_err(|e| anyhow::anyhow!("Failed to unwrap DEK: {}", e))?;

        if dek_bytes.len() != DEK_SIZE {
            anyhow::bail!("Invalid DEK size after unwrap");
        }

        let dek_cipher = Aes256Gcm::new_from_slice(&dek_bytes)
            .map_err(|e| anyhow::anyhow!("Failed to create DEK cipher: {}", e))?;

        let data_nonce_bytes = BASE64.decode(&payload.nonce).context("Failed to decode nonce")?;
        let data_nonce = Nonce::from_slice(&data_nonce_bytes);

        let ciphertext = BASE64
            .decode(&payload.ciphertext)
            .context("Failed to decode ciphertext")?;

        let plaintext = dek_cipher
            .decrypt(data_nonce, ciphertext.as_ref())
            .map_err(|e| anyhow::anyhow!("Decryption failed (data may be corrupted): {}", e))?;

        Ok(plaintext)
    }

    /// Encrypt a string, returns bytes suitable for a header value or DB column.
    pub fn encrypt_string(&self, plaintext: &str) -> Result<Vec<u8>> {
        self.encrypt(plaintext.as_bytes())
    }

    /// Decrypt bytes to a string. Used to recover the HTTP adapter's
    /// Authorization header and Vault AppRole secret material.
    pub fn decrypt_to_string(&self, data: &[u8]) -> Result<String> {
        let plaintext = self.decrypt(data)?;
        String::from_utf8(plaintext).context("Decrypted data is not valid UTF-8")
    }

    pub fn primary_key_id(&self) -> &str {
        &self.primary_key.id
    }
}

/// Generate a new random encryption key in versioned format: "key_id:base64_key".
pub fn generate_encryption_key(key_id: &str) -> String {
    let mut key = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut key);
    format!("{}:{}", key_id, BASE64.encode(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key(id: &str) -> String {
        generate_encryption_key(id)
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let key = test_key("kek-v1");
        let service = EncryptionService::new(&key, &[]).unwrap();

        let ciphertext = service.encrypt_string("Bearer super-secret-token").unwrap();
        let plaintext = service.decrypt_to_string(&ciphertext).unwrap();
        assert_eq!(plaintext, "Bearer super-secret-token");
    }

    #[test]
    fn decrypt_with_rotated_key_still_works() {
        let old_key = test_key("kek-v1");
        let new_key = test_key("kek-v2");

        let old_service = EncryptionService::new(&old_key, &[]).unwrap();
        let ciphertext = old_service.encrypt_string("role-id-secret").unwrap();

        let rotated_service = EncryptionService::new(&new_key, &[old_key.as_str()]).unwrap();
        let plaintext = rotated_service.decrypt_to_string(&ciphertext).unwrap();
        assert_eq!(plaintext, "role-id-secret");
    }

    #[test]
    fn unknown_key_id_fails_decryption() {
        let key_a = test_key("kek-a");
        let key_b = test_key("kek-b");

        let service_a = EncryptionService::new(&key_a, &[]).unwrap();
        let ciphertext = service_a.encrypt_string("secret").unwrap();

        let service_b = EncryptionService::new(&key_b, &[]).unwrap();
        assert!(service_b.decrypt_to_string(&ciphertext).is_err());
    }
}
