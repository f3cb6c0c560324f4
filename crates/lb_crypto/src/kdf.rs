//! Key derivation
//!
//! `derive_session_key` — Argon2id, turns the master secret and the account's
//!   stored salt into the 32-byte key that seals every credential record.
//!
//! The salt is not secret and is persisted next to the account.

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;

pub const SESSION_KEY_LEN: usize = 32;

/// Salts shorter than this are rejected by Argon2.
pub const MIN_SALT_LEN: usize = 8;

// ── Session key ──────────────────────────────────────────────────────────────

/// 32-byte record key derived from the master secret. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct SessionKey([u8; SESSION_KEY_LEN]);

impl SessionKey {
    pub fn from_bytes(bytes: [u8; SESSION_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey([REDACTED])")
    }
}

// ── Argon2id ─────────────────────────────────────────────────────────────────

/// Argon2id cost parameters. Defaults are tuned for interactive desktop use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: 64 * 1024, // 64 MiB
            t_cost: 3,
            p_cost: 1,
        }
    }
}

impl KdfParams {
    fn to_argon2(self) -> Result<Params, CryptoError> {
        Params::new(self.m_cost, self.t_cost, self.p_cost, Some(SESSION_KEY_LEN))
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))
    }
}

/// Derive a session key from the master secret + salt.
///
/// This is CPU and memory heavy; async callers should run it on a blocking
/// worker (see `XChaChaProvider`).
pub fn derive_session_key(
    secret: &[u8],
    salt: &[u8],
    params: KdfParams,
) -> Result<SessionKey, CryptoError> {
    if salt.len() < MIN_SALT_LEN {
        return Err(CryptoError::InvalidSalt(format!(
            "expected at least {MIN_SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon2()?);
    let mut output = Zeroizing::new([0u8; SESSION_KEY_LEN]);
    argon2
        .hash_password_into(secret, salt, &mut output[..])
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(SessionKey(*output))
}

/// Generate a fresh random 16-byte salt.
/// Call once when the account's vault is first created; store it with the account.
pub fn generate_salt() -> [u8; 16] {
    use rand::RngCore;
    let mut salt = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}
