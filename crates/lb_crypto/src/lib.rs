//! lb_crypto — Lockbox cryptographic primitives
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize all secret material on drop.
//! - The session layer only talks to the `CryptoProvider` trait.
//!
//! # Module layout
//! - `kdf`       — Argon2id derivation of the session key
//! - `aead`      — XChaCha20-Poly1305 seal/open of credential records
//! - `provider`  — the async `CryptoProvider` capability + stock implementation
//! - `error`     — unified error type

pub mod aead;
pub mod error;
pub mod kdf;
pub mod provider;

pub use aead::Sealed;
pub use error::CryptoError;
pub use kdf::{KdfParams, SessionKey};
pub use provider::{CryptoProvider, XChaChaProvider};
