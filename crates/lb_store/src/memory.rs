//! In-process `RemoteStore`.
//!
//! Keeps each account's records in insertion order and assigns UUID v4 ids,
//! the way the hosted store does. Used by tests and by embedders that keep
//! the vault local.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{AccountId, EncryptedRecord, NewRecord, RecordUpdate};
use crate::remote::RemoteStore;

/// Cheap to clone (Arc internally); clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    accounts: Arc<RwLock<HashMap<AccountId, Vec<EncryptedRecord>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed record as-is, bypassing id assignment.
    /// Useful to seed a store with records written elsewhere.
    pub fn insert_raw(&self, account: &AccountId, record: EncryptedRecord) {
        self.accounts
            .write()
            .entry(account.clone())
            .or_default()
            .push(record);
    }

    /// Snapshot of `account`'s records.
    pub fn records(&self, account: &AccountId) -> Vec<EncryptedRecord> {
        self.accounts
            .read()
            .get(account)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self, account: &AccountId) -> usize {
        self.accounts.read().get(account).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, account: &AccountId) -> bool {
        self.len(account) == 0
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list(&self, account: &AccountId) -> Result<Vec<EncryptedRecord>, StoreError> {
        Ok(self.records(account))
    }

    async fn create(&self, account: &AccountId, record: NewRecord) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let updated_at = record.updated_at.max(record.created_at);
        self.insert_raw(
            account,
            EncryptedRecord {
                id: id.clone(),
                ciphertext: record.ciphertext,
                iv: record.iv,
                tags: record.tags,
                created_at: record.created_at,
                updated_at,
            },
        );
        debug!(account = %account, record_id = %id, "record created");
        Ok(id)
    }

    async fn update(
        &self,
        account: &AccountId,
        id: &str,
        update: RecordUpdate,
    ) -> Result<(), StoreError> {
        let mut guard = self.accounts.write();
        let record = guard
            .get_mut(account)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.ciphertext = update.ciphertext;
        record.iv = update.iv;
        record.tags = update.tags;
        record.updated_at = update.updated_at.max(record.created_at);
        debug!(account = %account, record_id = %id, "record updated");
        Ok(())
    }

    async fn delete(&self, account: &AccountId, id: &str) -> Result<(), StoreError> {
        let mut guard = self.accounts.write();
        let records = guard
            .get_mut(account)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!(account = %account, record_id = %id, "record deleted");
        Ok(())
    }
}
