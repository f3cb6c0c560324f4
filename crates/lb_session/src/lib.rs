//! lb_session — Vault session manager for Lockbox
//!
//! Turns a master password into a transient session key, keeps the decrypted
//! credentials in memory while unlocked, writes changes through to the remote
//! encrypted store, and locks itself after a period of inactivity.
//!
//! # Module layout
//! - `session`   — `Session`: Locked/Unlocking/Unlocked state machine + record CRUD
//! - `fanout`    — per-record decryption with failure isolation (sentinels)
//! - `cache`     — ordered decrypted record cache
//! - `timer`     — single-deadline auto-lock timer
//! - `identity`  — locks the session when the signed-in account goes away
//! - `record`    — decrypted record types
//! - `settings`  — session configuration
//! - `error`     — unified error type

mod busy;
pub mod cache;
pub mod error;
pub mod fanout;
pub mod identity;
pub mod record;
pub mod session;
pub mod settings;
mod timer;

pub use error::SessionError;
pub use identity::IdentitySubscription;
pub use record::{CredentialData, DecryptedRecord, SENTINEL_TITLE};
pub use session::{Session, SessionState};
pub use settings::SessionSettings;
