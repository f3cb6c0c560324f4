//! Authenticated encryption of credential records
//!
//! Uses XChaCha20-Poly1305 (192-bit nonce).
//! Key size: 32 bytes.  IV: 24 bytes (random per seal).  Tag: 16 bytes.
//!
//! The remote store keeps the iv next to the ciphertext, so unlike a
//! single-blob wire format the two travel as separate fields of `Sealed`.

use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng as AeadOsRng, Payload},
    XChaCha20Poly1305, XNonce,
};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::kdf::SessionKey;

pub const IV_LEN: usize = 24;

/// Associated data bound into every record tag.
const RECORD_AAD: &[u8] = b"lockbox-record-v1";

/// Output of a seal: ciphertext (with tag) and the iv it was sealed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub iv: Vec<u8>,
}

/// Encrypt `plaintext` under `key` with a fresh random iv.
pub fn seal(key: &SessionKey, plaintext: &[u8]) -> Result<Sealed, CryptoError> {
    let cipher = XChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|_| CryptoError::AeadEncrypt)?;

    let nonce = XChaCha20Poly1305::generate_nonce(&mut AeadOsRng);

    let ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad: RECORD_AAD,
            },
        )
        .map_err(|_| CryptoError::AeadEncrypt)?;

    Ok(Sealed {
        ciphertext,
        iv: nonce.to_vec(),
    })
}

/// Decrypt a record sealed by `seal`.
pub fn open(
    key: &SessionKey,
    ciphertext: &[u8],
    iv: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if iv.len() != IV_LEN {
        return Err(CryptoError::AeadDecrypt);
    }
    let nonce = XNonce::from_slice(iv);

    let cipher = XChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|_| CryptoError::AeadDecrypt)?;

    let plaintext = cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad: RECORD_AAD,
            },
        )
        .map_err(|_| CryptoError::AeadDecrypt)?;

    Ok(Zeroizing::new(plaintext))
}
