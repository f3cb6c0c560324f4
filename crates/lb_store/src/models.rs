//! Record models exchanged with the remote store.
//!
//! Everything here is ciphertext or non-sensitive metadata; plaintext
//! credential fields never cross this boundary.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of the signed-in account that owns a set of records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A credential record as persisted remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRecord {
    /// Store-assigned, immutable once created.
    pub id: String,
    pub ciphertext: Vec<u8>,
    pub iv: Vec<u8>,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    /// Never earlier than `created_at`.
    pub updated_at: DateTime<Utc>,
}

/// Payload for `RemoteStore::create`. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub ciphertext: Vec<u8>,
    pub iv: Vec<u8>,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `RemoteStore::update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub ciphertext: Vec<u8>,
    pub iv: Vec<u8>,
    pub tags: BTreeSet<String>,
    pub updated_at: DateTime<Utc>,
}
