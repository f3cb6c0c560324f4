//! Decryption fan-out used by unlock and refresh.
//!
//! Every record is opened independently and the batch always runs to the end:
//! a record that fails to decrypt or parse becomes a sentinel and is logged,
//! it never fails the batch. Output order equals input order.

use futures::future::join_all;
use lb_crypto::{CryptoProvider, SessionKey};
use lb_store::EncryptedRecord;
use tracing::warn;

use crate::error::SessionError;
use crate::record::{CredentialData, DecryptedRecord};

/// Result of one fan-out pass.
#[derive(Debug)]
pub struct FanOutReport {
    pub records: Vec<DecryptedRecord>,
    /// How many of `records` are sentinels.
    pub failed: usize,
}

pub async fn decrypt_all(
    crypto: &dyn CryptoProvider,
    key: &SessionKey,
    records: Vec<EncryptedRecord>,
) -> FanOutReport {
    let attempts = records
        .into_iter()
        .map(|record| decrypt_one(crypto, key, record));
    let outcomes = join_all(attempts).await;

    let failed = outcomes.iter().filter(|(_, ok)| !ok).count();
    FanOutReport {
        records: outcomes.into_iter().map(|(record, _)| record).collect(),
        failed,
    }
}

async fn decrypt_one(
    crypto: &dyn CryptoProvider,
    key: &SessionKey,
    record: EncryptedRecord,
) -> (DecryptedRecord, bool) {
    match open_record(crypto, key, &record).await {
        Ok(data) => (DecryptedRecord::opened(record, data), true),
        Err(err) => {
            warn!(record_id = %record.id, error = %err, "record could not be decrypted; substituting sentinel");
            (DecryptedRecord::sentinel(record), false)
        }
    }
}

async fn open_record(
    crypto: &dyn CryptoProvider,
    key: &SessionKey,
    record: &EncryptedRecord,
) -> Result<CredentialData, SessionError> {
    let plaintext = crypto.decrypt(&record.ciphertext, &record.iv, key).await?;
    Ok(serde_json::from_str(&plaintext)?)
}
