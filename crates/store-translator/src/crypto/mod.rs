//! Value cipher capability.
//!
//! [`CryptorImpl`] is built from configuration and is the only type callers
//! hold; whether it encrypts or passes values through is a configuration
//! detail, never a branch in calling code.
//!
//! Sealed strings from [`AesGcmCryptor`] are `base64(nonce || ciphertext)`
//! with a fresh 96-bit nonce per call.

use std::sync::atomic::{AtomicBool, Ordering};

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

use crate::config::{CryptoConfig, CryptoMode};
use crate::error::{Result, TranslateError};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Symmetric cipher over bytes and strings.
pub trait Cryptor: Send + Sync {
    fn name(&self) -> &str;

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// Encrypt a string into its printable sealed form.
    fn seal(&self, value: &str) -> Result<String>;

    /// Reverse [`seal`](Self::seal).
    fn unseal(&self, value: &str) -> Result<String>;
}

/// Identity transform. Warns once that values are not protected.
#[derive(Debug, Default)]
pub struct NullCryptor {
    warned: AtomicBool,
}

impl NullCryptor {
    pub fn new() -> Self {
        Self::default()
    }

    fn warn_once(&self) {
        if !self.warned.swap(true, Ordering::SeqCst) {
            warn!("No cipher configured: values pass through unencrypted");
        }
    }
}

impl Cryptor for NullCryptor {
    fn name(&self) -> &str {
        "none"
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.warn_once();
        Ok(plaintext.to_vec())
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        Ok(ciphertext.to_vec())
    }

    fn seal(&self, value: &str) -> Result<String> {
        self.warn_once();
        Ok(value.to_string())
    }

    fn unseal(&self, value: &str) -> Result<String> {
        Ok(value.to_string())
    }
}

/// AES-256-GCM with random nonces.
pub struct AesGcmCryptor {
    cipher: Aes256Gcm,
}

impl AesGcmCryptor {
    pub fn new(key: &[u8; KEY_LEN]) -> Result<Self> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| TranslateError::Crypto(format!("invalid encryption key: {e}")))?;
        Ok(Self { cipher })
    }

    /// Build from a 64-character hex key.
    pub fn from_hex_key(hex_key: &str) -> Result<Self> {
        let bytes = hex::decode(hex_key.trim())
            .map_err(|e| TranslateError::Crypto(format!("key is not valid hex: {e}")))?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            TranslateError::Crypto(format!(
                "key must be {} bytes, got {}",
                KEY_LEN,
                b.len()
            ))
        })?;
        Self::new(&key)
    }
}

impl std::fmt::Debug for AesGcmCryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmCryptor").finish_non_exhaustive()
    }
}

impl Cryptor for AesGcmCryptor {
    fn name(&self) -> &str {
        "aes-gcm"
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| TranslateError::Crypto(format!("encryption failed: {e}")))?;
        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() < NONCE_LEN {
            return Err(TranslateError::Crypto("ciphertext too short".into()));
        }
        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| TranslateError::Crypto(format!("decryption failed: {e}")))
    }

    fn seal(&self, value: &str) -> Result<String> {
        Ok(STANDARD.encode(self.encrypt(value.as_bytes())?))
    }

    fn unseal(&self, value: &str) -> Result<String> {
        let payload = STANDARD
            .decode(value.trim())
            .map_err(|e| TranslateError::Crypto(format!("sealed value is not base64: {e}")))?;
        String::from_utf8(self.decrypt(&payload)?)
            .map_err(|e| TranslateError::Crypto(format!("unsealed value is not UTF-8: {e}")))
    }
}

/// Enum-based static dispatch over the available ciphers.
#[derive(Debug)]
pub enum CryptorImpl {
    Null(NullCryptor),
    AesGcm(AesGcmCryptor),
}

impl Cryptor for CryptorImpl {
    fn name(&self) -> &str {
        match self {
            CryptorImpl::Null(c) => c.name(),
            CryptorImpl::AesGcm(c) => c.name(),
        }
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        match self {
            CryptorImpl::Null(c) => c.encrypt(plaintext),
            CryptorImpl::AesGcm(c) => c.encrypt(plaintext),
        }
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        match self {
            CryptorImpl::Null(c) => c.decrypt(ciphertext),
            CryptorImpl::AesGcm(c) => c.decrypt(ciphertext),
        }
    }

    fn seal(&self, value: &str) -> Result<String> {
        match self {
            CryptorImpl::Null(c) => c.seal(value),
            CryptorImpl::AesGcm(c) => c.seal(value),
        }
    }

    fn unseal(&self, value: &str) -> Result<String> {
        match self {
            CryptorImpl::Null(c) => c.unseal(value),
            CryptorImpl::AesGcm(c) => c.unseal(value),
        }
    }
}

impl CryptorImpl {
    /// Build the configured cipher.
    ///
    /// # Errors
    ///
    /// For `aes-gcm`, fails if `key_env` is unset, the variable is missing,
    /// or its value is not a 32-byte hex key.
    pub fn from_config(config: &CryptoConfig) -> Result<Self> {
        match config.mode {
            CryptoMode::None => Ok(CryptorImpl::Null(NullCryptor::new())),
            CryptoMode::AesGcm => {
                let var = config.key_env.as_deref().ok_or_else(|| {
                    TranslateError::Config("crypto.key_env is required for aes-gcm".into())
                })?;
                let key = std::env::var(var).map_err(|_| {
                    TranslateError::Crypto(format!("environment variable {} is not set", var))
                })?;
                Ok(CryptorImpl::AesGcm(AesGcmCryptor::from_hex_key(&key)?))
            }
        }
    }
}
