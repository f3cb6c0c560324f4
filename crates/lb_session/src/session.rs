//! Session: the unlocked vault held in memory.
//!
//! The session owns the 32-byte record key and the decrypted cache while the
//! user is unlocked. Locking (explicit, auto-lock, or sign-out) drops both in
//! the same critical section, and the key is zeroized on drop.
//!
//! Auto-lock: a single inactivity deadline (15 minutes by default), pushed back
//! by unlock and by every record operation.
//!
//! All mutable state sits behind one `parking_lot::Mutex` that is never held
//! across an `.await`; operations read the key once at their start and only
//! touch shared state before and after their crypto/store calls.

use std::collections::BTreeSet;
use std::sync::{Arc, Weak};

use chrono::Utc;
use lb_crypto::{CryptoProvider, SessionKey};
use lb_store::{AccountId, NewRecord, RecordUpdate, RemoteStore};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

use crate::busy::BusyCounter;
use crate::cache::DecryptedCache;
use crate::error::SessionError;
use crate::fanout::decrypt_all;
use crate::identity::{spawn_identity_watch, IdentitySubscription};
use crate::record::{CredentialData, DecryptedRecord};
use crate::settings::SessionSettings;
use crate::timer::AutoLockTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Locked,
    Unlocking,
    Unlocked,
}

struct SessionInner {
    state: SessionState,
    /// Present iff `state == Unlocked`.
    key: Option<Arc<SessionKey>>,
    cache: DecryptedCache,
    /// Account the session is unlocking/unlocked for.
    account: Option<AccountId>,
    timer: AutoLockTimer,
    /// Bumped by every lock; lets in-flight operations notice they were overtaken.
    epoch: u64,
}

impl SessionInner {
    /// Clear key, cache and timer together and go to Locked.
    fn wipe(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.key = None;
        self.cache.clear();
        self.account = None;
        self.timer.cancel();
        self.state = SessionState::Locked;
    }
}

pub(crate) struct SessionCore {
    crypto: Arc<dyn CryptoProvider>,
    store: Arc<dyn RemoteStore>,
    identity: watch::Receiver<Option<AccountId>>,
    inner: Mutex<SessionInner>,
    busy: BusyCounter,
}

impl SessionCore {
    fn active_account(&self) -> Option<AccountId> {
        self.identity.borrow().clone()
    }

    fn lock(&self) {
        let mut inner = self.inner.lock();
        if inner.state != SessionState::Locked {
            info!("vault locked");
        }
        inner.wipe();
    }

    /// Auto-lock firing. Ignored if a reset or lock superseded it.
    fn expire(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Unlocked && inner.timer.is_current(generation) {
            info!("auto-lock deadline reached; locking vault");
            inner.wipe();
        }
    }

    /// Lock unless the session is (being) unlocked for `current`.
    pub(crate) fn on_identity_change(&self, current: Option<&AccountId>) {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Locked || inner.account.as_ref() == current {
            return;
        }
        match current {
            None => info!("account signed out; locking vault"),
            Some(account) => info!(account = %account, "account switched; locking vault"),
        }
        inner.wipe();
    }

    /// Failed unlock: end Locked, unless a lock already overtook this attempt.
    fn abort_unlock(&self, epoch: u64) {
        let mut inner = self.inner.lock();
        if inner.epoch == epoch {
            inner.wipe();
        }
    }
}

/// What an operation captured at its start.
struct OpContext {
    key: Arc<SessionKey>,
    account: AccountId,
    epoch: u64,
}

impl OpContext {
    /// The session is still the one this operation started in.
    fn is_current(&self, inner: &SessionInner) -> bool {
        inner.epoch == self.epoch && inner.state == SessionState::Unlocked
    }
}

/// Handle to a vault session. Cheap to clone (Arc internally); the session is
/// torn down, and its auto-lock cancelled, when the last handle is dropped.
#[derive(Clone)]
pub struct Session {
    core: Arc<SessionCore>,
}

impl Session {
    /// A fresh session always starts Locked.
    pub fn new(
        crypto: Arc<dyn CryptoProvider>,
        store: Arc<dyn RemoteStore>,
        identity: watch::Receiver<Option<AccountId>>,
        settings: SessionSettings,
    ) -> Self {
        let inner = SessionInner {
            state: SessionState::Locked,
            key: None,
            cache: DecryptedCache::new(),
            account: None,
            timer: AutoLockTimer::new(settings.auto_lock()),
            epoch: 0,
        };
        Self {
            core: Arc::new(SessionCore {
                crypto,
                store,
                identity,
                inner: Mutex::new(inner),
                busy: BusyCounter::default(),
            }),
        }
    }

    /// Lock whenever the signed-in account goes away or changes.
    /// Keep the returned subscription for as long as the session should react;
    /// dropping it unregisters the observer.
    pub fn observe_identity(&self) -> IdentitySubscription {
        spawn_identity_watch(Arc::downgrade(&self.core), self.core.identity.clone())
    }

    // ── Read side ───────────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.core.inner.lock().state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state() == SessionState::Unlocked
    }

    /// True while any operation is in flight.
    pub fn loading(&self) -> bool {
        self.core.busy.is_busy()
    }

    /// Snapshot of the cached records, in order. Empty while locked.
    pub fn entries(&self) -> Vec<DecryptedRecord> {
        self.core.inner.lock().cache.snapshot()
    }

    pub fn entry(&self, id: &str) -> Option<DecryptedRecord> {
        self.core.inner.lock().cache.get(id).cloned()
    }

    pub fn entries_with_tag(&self, tag: &str) -> Vec<DecryptedRecord> {
        self.core
            .inner
            .lock()
            .cache
            .with_tag(tag)
            .cloned()
            .collect()
    }

    /// Time left before auto-lock; None while not unlocked.
    pub fn time_until_lock(&self) -> Option<Duration> {
        let inner = self.core.inner.lock();
        match inner.state {
            SessionState::Unlocked => inner.timer.remaining(),
            _ => None,
        }
    }

    pub fn active_account(&self) -> Option<AccountId> {
        self.core.active_account()
    }

    // ── State machine ───────────────────────────────────────────────────────

    /// Derive the session key, fetch and decrypt every record, start auto-lock.
    ///
    /// Calling this while already unlocked re-derives and re-fetches; the
    /// current key stays resident until the new one replaces it.
    pub async fn unlock_vault(&self, master_secret: &str, salt: &[u8]) -> Result<(), SessionError> {
        let account = self
            .core
            .active_account()
            .ok_or(SessionError::NotAuthenticated)?;
        let _busy = self.core.busy.acquire();

        let epoch = {
            let mut inner = self.core.inner.lock();
            if inner.state == SessionState::Locked {
                inner.state = SessionState::Unlocking;
                inner.account = Some(account.clone());
            }
            inner.epoch
        };
        info!(account = %account, "unlocking vault");

        let key = match self.core.crypto.derive_key(master_secret, salt).await {
            Ok(key) => Arc::new(key),
            Err(err) => {
                error!(error = %err, "key derivation failed");
                self.core.abort_unlock(epoch);
                return Err(err.into());
            }
        };

        let listing = match self.core.store.list(&account).await {
            Ok(listing) => listing,
            Err(err) => {
                error!(account = %account, error = %err, "fetching records failed");
                self.core.abort_unlock(epoch);
                return Err(err.into());
            }
        };

        let report = decrypt_all(self.core.crypto.as_ref(), &key, listing).await;

        let mut inner = self.core.inner.lock();
        if inner.epoch != epoch {
            warn!("vault was locked while unlocking; discarding result");
            return Err(SessionError::VaultLocked);
        }
        // Deadline first: the key is never resident without one.
        self.arm_auto_lock(&mut inner);
        inner.key = Some(key);
        inner.cache.replace_all(report.records);
        inner.account = Some(account);
        inner.state = SessionState::Unlocked;
        info!(
            count = inner.cache.len(),
            failed = report.failed,
            "vault unlocked"
        );
        Ok(())
    }

    /// Drop the key and the cache, cancel auto-lock. Safe to call in any state.
    pub fn lock_vault(&self) {
        self.core.lock();
    }

    // ── Record operations ───────────────────────────────────────────────────

    /// Seal and store a new credential, then append it to the cache.
    /// Returns the id assigned by the store.
    pub async fn add_entry(
        &self,
        data: CredentialData,
        tags: BTreeSet<String>,
    ) -> Result<String, SessionError> {
        let ctx = self.begin()?;
        let _busy = self.core.busy.acquire();

        let plaintext = Zeroizing::new(serde_json::to_string(&data)?);
        let sealed = self
            .core
            .crypto
            .encrypt(&plaintext, &ctx.key)
            .await
            .inspect_err(|err| error!(error = %err, "sealing new record failed"))?;

        // Local timestamps; the store may assign its own and refresh reconciles.
        let now = Utc::now();
        let id = self
            .core
            .store
            .create(
                &ctx.account,
                NewRecord {
                    ciphertext: sealed.ciphertext,
                    iv: sealed.iv,
                    tags: tags.clone(),
                    created_at: now,
                    updated_at: now,
                },
            )
            .await
            .inspect_err(|err| error!(error = %err, "storing new record failed"))?;

        let mut inner = self.core.inner.lock();
        if ctx.is_current(&inner) {
            inner.cache.append(DecryptedRecord {
                id: id.clone(),
                data,
                tags,
                created_at: now,
                updated_at: now,
            });
        }
        debug!(record_id = %id, "record added");
        Ok(id)
    }

    /// Re-seal and store `id`, then update its cache entry in place.
    /// An id missing from the cache leaves the cache unchanged.
    pub async fn update_entry(
        &self,
        id: &str,
        data: CredentialData,
        tags: BTreeSet<String>,
    ) -> Result<(), SessionError> {
        let ctx = self.begin()?;
        let _busy = self.core.busy.acquire();

        let plaintext = Zeroizing::new(serde_json::to_string(&data)?);
        let sealed = self
            .core
            .crypto
            .encrypt(&plaintext, &ctx.key)
            .await
            .inspect_err(|err| error!(record_id = %id, error = %err, "sealing record failed"))?;

        let now = Utc::now();
        self.core
            .store
            .update(
                &ctx.account,
                id,
                RecordUpdate {
                    ciphertext: sealed.ciphertext,
                    iv: sealed.iv,
                    tags: tags.clone(),
                    updated_at: now,
                },
            )
            .await
            .inspect_err(|err| error!(record_id = %id, error = %err, "storing record update failed"))?;

        let mut inner = self.core.inner.lock();
        if ctx.is_current(&inner) && !inner.cache.replace_fields(id, data, tags, now) {
            debug!(record_id = %id, "updated record is not cached");
        }
        Ok(())
    }

    /// Delete `id` remotely, then drop it from the cache if present.
    pub async fn delete_entry(&self, id: &str) -> Result<(), SessionError> {
        let ctx = self.begin()?;
        let _busy = self.core.busy.acquire();

        self.core
            .store
            .delete(&ctx.account, id)
            .await
            .inspect_err(|err| error!(record_id = %id, error = %err, "deleting record failed"))?;

        let mut inner = self.core.inner.lock();
        if ctx.is_current(&inner) {
            inner.cache.remove(id);
        }
        debug!(record_id = %id, "record deleted");
        Ok(())
    }

    /// Re-fetch and re-decrypt everything, replacing the cache.
    /// Does nothing while the vault is not unlocked; a lock that lands while
    /// the fetch is in flight discards the result the same way. On a failed
    /// fetch the previous cache is kept.
    pub async fn refresh_entries(&self) -> Result<(), SessionError> {
        let ctx = match self.begin() {
            Ok(ctx) => ctx,
            Err(SessionError::VaultLocked) => return Ok(()),
            Err(err) => return Err(err),
        };
        let _busy = self.core.busy.acquire();

        let listing = self
            .core
            .store
            .list(&ctx.account)
            .await
            .inspect_err(|err| error!(error = %err, "refreshing records failed"))?;

        let report = decrypt_all(self.core.crypto.as_ref(), &ctx.key, listing).await;

        let mut inner = self.core.inner.lock();
        if !ctx.is_current(&inner) {
            warn!("vault was locked while refreshing; discarding result");
            return Ok(());
        }
        inner.cache.replace_all(report.records);
        debug!(
            count = inner.cache.len(),
            failed = report.failed,
            "records refreshed"
        );
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────────────

    /// Precondition check shared by the record operations. On success the
    /// auto-lock deadline has been pushed back.
    fn begin(&self) -> Result<OpContext, SessionError> {
        let mut inner = self.core.inner.lock();
        if inner.state != SessionState::Unlocked {
            return Err(SessionError::VaultLocked);
        }
        let key = inner.key.clone().ok_or(SessionError::VaultLocked)?;
        let account = match (self.core.active_account(), inner.account.clone()) {
            (Some(active), Some(unlocked_for)) if active == unlocked_for => active,
            _ => return Err(SessionError::NotAuthenticated),
        };
        self.arm_auto_lock(&mut inner);
        Ok(OpContext {
            key,
            account,
            epoch: inner.epoch,
        })
    }

    fn arm_auto_lock(&self, inner: &mut SessionInner) {
        let core: Weak<SessionCore> = Arc::downgrade(&self.core);
        inner.timer.reset(move |generation| {
            if let Some(core) = core.upgrade() {
                core.expire(generation);
            }
        });
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.core.inner.lock();
        f.debug_struct("Session")
            .field("state", &inner.state)
            .field("account", &inner.account)
            .field("entries", &inner.cache.len())
            .field("auto_lock_armed", &inner.timer.is_armed())
            .finish()
    }
}
