use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Vault is locked — unlock with the master password first")]
    VaultLocked,

    #[error("Not authenticated — no account is signed in")]
    NotAuthenticated,

    #[error("Crypto error: {0}")]
    Crypto(#[from] lb_crypto::CryptoError),

    #[error("Store error: {0}")]
    Store(#[from] lb_store::StoreError),

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}

impl SessionError {
    /// True for the precondition failures that are raised before any side effect.
    pub fn is_precondition(&self) -> bool {
        matches!(self, SessionError::VaultLocked | SessionError::NotAuthenticated)
    }
}
