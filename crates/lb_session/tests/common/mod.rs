#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use lb_crypto::{CryptoError, CryptoProvider, Sealed, SessionKey};
use lb_session::{CredentialData, Session, SessionSettings};
use lb_store::{
    AccountId, EncryptedRecord, MemoryStore, NewRecord, RecordUpdate, RemoteStore, StoreError,
};
use tokio::sync::{watch, Semaphore};
use zeroize::Zeroizing;

pub const SECRET: &str = "S1";
pub const SALT: &[u8] = b"aaa=";

pub fn alice() -> AccountId {
    AccountId::from("alice")
}

pub fn tags(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("lb_session=debug")
        .try_init();
}

// ── Crypto ───────────────────────────────────────────────────────────────────

/// Deterministic stand-in for the real primitives: the key is a fold of
/// secret + salt, ciphertext is a key-check byte followed by the XOR-masked
/// plaintext. Decrypting with any other key fails.
#[derive(Default)]
pub struct FakeCrypto {
    pub fail_derive: AtomicBool,
    pub fail_encrypt: AtomicBool,
    pub derive_calls: AtomicUsize,
    iv_counter: AtomicU8,
}

impl FakeCrypto {
    fn key_for(secret: &str, salt: &[u8]) -> SessionKey {
        let mut key = [0u8; 32];
        for (i, byte) in secret.bytes().chain(salt.iter().copied()).enumerate() {
            let slot = &mut key[i % 32];
            *slot = slot.wrapping_mul(31).wrapping_add(byte).wrapping_add(1);
        }
        SessionKey::from_bytes(key)
    }

    fn check_byte(key: &SessionKey) -> u8 {
        key.as_bytes()
            .iter()
            .fold(0x5au8, |acc, b| acc.rotate_left(3) ^ b)
    }

    fn mask(key: &SessionKey, iv: &[u8], data: &[u8]) -> Vec<u8> {
        data.iter()
            .enumerate()
            .map(|(i, b)| b ^ key.as_bytes()[i % 32] ^ iv[i % iv.len()])
            .collect()
    }

    /// Seal outside of a session, as another device would have.
    pub fn seal_with(&self, secret: &str, salt: &[u8], data: &CredentialData) -> Sealed {
        let key = Self::key_for(secret, salt);
        let plaintext = serde_json::to_string(data).unwrap();
        self.seal_raw(&key, plaintext.as_bytes())
    }

    fn seal_raw(&self, key: &SessionKey, plaintext: &[u8]) -> Sealed {
        let iv = vec![self.iv_counter.fetch_add(1, Ordering::SeqCst), 0x11, 0x22, 0x33];
        let mut ciphertext = vec![Self::check_byte(key)];
        ciphertext.extend(Self::mask(key, &iv, plaintext));
        Sealed { ciphertext, iv }
    }
}

#[async_trait]
impl CryptoProvider for FakeCrypto {
    async fn derive_key(&self, secret: &str, salt: &[u8]) -> Result<SessionKey, CryptoError> {
        self.derive_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_derive.load(Ordering::SeqCst) {
            return Err(CryptoError::KeyDerivation("injected failure".into()));
        }
        if salt.is_empty() {
            return Err(CryptoError::InvalidSalt("empty salt".into()));
        }
        Ok(Self::key_for(secret, salt))
    }

    async fn encrypt(&self, plaintext: &str, key: &SessionKey) -> Result<Sealed, CryptoError> {
        if self.fail_encrypt.load(Ordering::SeqCst) {
            return Err(CryptoError::AeadEncrypt);
        }
        Ok(self.seal_raw(key, plaintext.as_bytes()))
    }

    async fn decrypt(
        &self,
        ciphertext: &[u8],
        iv: &[u8],
        key: &SessionKey,
    ) -> Result<Zeroizing<String>, CryptoError> {
        match ciphertext.split_first() {
            Some((check, body)) if *check == Self::check_byte(key) && !iv.is_empty() => {
                let plaintext = Self::mask(key, iv, body);
                Ok(Zeroizing::new(String::from_utf8(plaintext)?))
            }
            _ => Err(CryptoError::AeadDecrypt),
        }
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

/// `MemoryStore` with injectable failures and an optional gate on `list`.
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_list: AtomicBool,
    pub fail_writes: AtomicBool,
    pub gate_list: AtomicBool,
    pub list_gate: Semaphore,
    pub list_calls: AtomicUsize,
    pub write_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_list: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            gate_list: AtomicBool::new(false),
            list_gate: Semaphore::new(0),
            list_calls: AtomicUsize::new(0),
            write_calls: AtomicUsize::new(0),
        }
    }

    fn check_write(&self) -> Result<(), StoreError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for FlakyStore {
    async fn list(&self, account: &AccountId) -> Result<Vec<EncryptedRecord>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.gate_list.load(Ordering::SeqCst) {
            self.list_gate
                .acquire()
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?
                .forget();
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        self.inner.list(account).await
    }

    async fn create(&self, account: &AccountId, record: NewRecord) -> Result<String, StoreError> {
        self.check_write()?;
        self.inner.create(account, record).await
    }

    async fn update(
        &self,
        account: &AccountId,
        id: &str,
        update: RecordUpdate,
    ) -> Result<(), StoreError> {
        self.check_write()?;
        self.inner.update(account, id, update).await
    }

    async fn delete(&self, account: &AccountId, id: &str) -> Result<(), StoreError> {
        self.check_write()?;
        self.inner.delete(account, id).await
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

pub struct Harness {
    pub session: Session,
    pub crypto: Arc<FakeCrypto>,
    pub store: Arc<FlakyStore>,
    pub memory: MemoryStore,
    pub identity: watch::Sender<Option<AccountId>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(SessionSettings::default())
    }

    pub fn with_settings(settings: SessionSettings) -> Self {
        init_tracing();
        let crypto = Arc::new(FakeCrypto::default());
        let memory = MemoryStore::new();
        let store = Arc::new(FlakyStore::new(memory.clone()));
        let (identity, identity_rx) = watch::channel(Some(alice()));
        let session = Session::new(crypto.clone(), store.clone(), identity_rx, settings);
        Self {
            session,
            crypto,
            store,
            memory,
            identity,
        }
    }

    /// Put a record sealed under `SECRET`/`SALT` straight into the store.
    pub fn seed(&self, title: &str, tag_names: &[&str]) -> String {
        let data = CredentialData::new(title, format!("{title}-user"), format!("{title}-pw"));
        let sealed = self.crypto.seal_with(SECRET, SALT, &data);
        self.seed_raw(sealed.ciphertext, sealed.iv, tag_names)
    }

    /// Put a record whose ciphertext cannot be opened into the store.
    pub fn seed_corrupted(&self, tag_names: &[&str]) -> String {
        let data = CredentialData::new("lost", "user", "pw");
        let mut sealed = self.crypto.seal_with(SECRET, SALT, &data);
        sealed.ciphertext[0] ^= 0xff;
        self.seed_raw(sealed.ciphertext, sealed.iv, tag_names)
    }

    fn seed_raw(&self, ciphertext: Vec<u8>, iv: Vec<u8>, tag_names: &[&str]) -> String {
        let id = format!("seed-{}", self.memory.len(&alice()) + 1);
        let now = Utc::now();
        self.memory.insert_raw(
            &alice(),
            EncryptedRecord {
                id: id.clone(),
                ciphertext,
                iv,
                tags: tags(tag_names),
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub async fn unlock(&self) {
        self.session.unlock_vault(SECRET, SALT).await.unwrap();
    }
}
