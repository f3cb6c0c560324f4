//! The crypto capability consumed by the session layer.
//!
//! `CryptoProvider` is the seam between session orchestration and the actual
//! primitives. `XChaChaProvider` is the stock implementation (Argon2id +
//! XChaCha20-Poly1305); tests and embedders may plug in their own.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::aead::{self, Sealed};
use crate::error::CryptoError;
use crate::kdf::{derive_session_key, KdfParams, SessionKey};

#[async_trait]
pub trait CryptoProvider: Send + Sync {
    /// Derive the session key for `secret` under `salt`.
    ///
    /// `salt` is the account's stored salt as raw bytes; decoding a text form
    /// (base64 or otherwise) is the caller's job. The stock provider requires
    /// at least [`MIN_SALT_LEN`](crate::kdf::MIN_SALT_LEN) bytes and reports
    /// anything shorter as `InvalidSalt`.
    async fn derive_key(&self, secret: &str, salt: &[u8]) -> Result<SessionKey, CryptoError>;

    /// Seal a plaintext record under `key`.
    async fn encrypt(&self, plaintext: &str, key: &SessionKey) -> Result<Sealed, CryptoError>;

    /// Open a sealed record. Fails on a wrong key or corrupted input.
    async fn decrypt(
        &self,
        ciphertext: &[u8],
        iv: &[u8],
        key: &SessionKey,
    ) -> Result<Zeroizing<String>, CryptoError>;
}

/// Argon2id key derivation + XChaCha20-Poly1305 record sealing.
#[derive(Debug, Clone, Default)]
pub struct XChaChaProvider {
    params: KdfParams,
}

impl XChaChaProvider {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl CryptoProvider for XChaChaProvider {
    async fn derive_key(&self, secret: &str, salt: &[u8]) -> Result<SessionKey, CryptoError> {
        // Argon2 would stall the executor for the whole memory-hard pass.
        let secret = Zeroizing::new(secret.as_bytes().to_vec());
        let salt = salt.to_vec();
        let params = self.params;
        tokio::task::spawn_blocking(move || derive_session_key(&secret, &salt, params))
            .await
            .map_err(|e| CryptoError::Worker(e.to_string()))?
    }

    async fn encrypt(&self, plaintext: &str, key: &SessionKey) -> Result<Sealed, CryptoError> {
        aead::seal(key, plaintext.as_bytes())
    }

    async fn decrypt(
        &self,
        ciphertext: &[u8],
        iv: &[u8],
        key: &SessionKey,
    ) -> Result<Zeroizing<String>, CryptoError> {
        let plaintext = aead::open(key, ciphertext, iv)?;
        let text = String::from_utf8(plaintext.to_vec())?;
        Ok(Zeroizing::new(text))
    }
}
