//! Decrypted credential records.
//!
//! SECURITY: `CredentialData` is zeroized on drop and its `Debug` output never
//! includes the password. Records only live in the session cache while the
//! vault is unlocked.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use lb_store::EncryptedRecord;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Title given to a record whose ciphertext could not be opened.
pub const SENTINEL_TITLE: &str = "[Decryption Failed]";

/// The structured plaintext sealed inside each record, serialized as JSON.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CredentialData {
    pub title: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub notes: String,
}

impl CredentialData {
    pub fn new(
        title: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            username: username.into(),
            password: password.into(),
            url: String::new(),
            notes: String::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

impl fmt::Debug for CredentialData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialData")
            .field("title", &self.title)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("url", &self.url)
            .field("notes", &self.notes)
            .finish()
    }
}

/// A credential as held in the session cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecryptedRecord {
    /// Mirrors the `EncryptedRecord` id.
    pub id: String,
    pub data: CredentialData,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DecryptedRecord {
    /// Pair successfully opened plaintext with the record's metadata.
    pub fn opened(record: EncryptedRecord, data: CredentialData) -> Self {
        Self {
            id: record.id,
            data,
            tags: record.tags,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    /// Placeholder for a record that could not be decrypted. Keeps the real id,
    /// tags and timestamps so the record stays addressable.
    pub fn sentinel(record: EncryptedRecord) -> Self {
        Self::opened(record, CredentialData::new(SENTINEL_TITLE, "", ""))
    }

    pub fn is_sentinel(&self) -> bool {
        self.data.title == SENTINEL_TITLE
            && self.data.username.is_empty()
            && self.data.password.is_empty()
            && self.data.url.is_empty()
            && self.data.notes.is_empty()
    }
}
