//! The remote persistence capability consumed by the session layer.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{AccountId, EncryptedRecord, NewRecord, RecordUpdate};

/// CRUD over encrypted records, scoped to one account.
///
/// Implementations talk to whatever backend holds the vault (an HTTP API,
/// a database, `MemoryStore`). They never see plaintext.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All records for `account`, in the store's canonical order.
    async fn list(&self, account: &AccountId) -> Result<Vec<EncryptedRecord>, StoreError>;

    /// Persist a new record and return the id the store assigned to it.
    async fn create(&self, account: &AccountId, record: NewRecord) -> Result<String, StoreError>;

    async fn update(
        &self,
        account: &AccountId,
        id: &str,
        update: RecordUpdate,
    ) -> Result<(), StoreError>;

    async fn delete(&self, account: &AccountId, id: &str) -> Result<(), StoreError>;
}
