//! lb_store — Remote encrypted record store boundary for Lockbox
//!
//! # Storage model
//! The remote store only ever holds ciphertext:
//! - each credential is one `EncryptedRecord` (ciphertext + iv + tags +
//!   timestamps), sealed client-side with the session key;
//! - ids and timestamps are plaintext metadata so the store can list, order
//!   and address records without being able to read them.
//!
//! `RemoteStore` is the capability the session layer consumes; `MemoryStore`
//! is an in-process implementation.

pub mod error;
pub mod memory;
pub mod models;
pub mod remote;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use models::{AccountId, EncryptedRecord, NewRecord, RecordUpdate};
pub use remote::RemoteStore;
