//! Binding between the session and the signed-in account.
//!
//! The host publishes the current account on a `watch` channel (`None` when
//! signed out). The observer task locks the session whenever that value stops
//! matching the account the session was unlocked for, and treats a closed
//! channel as a sign-out. It holds the session weakly so it never keeps a
//! torn-down session alive.

use std::sync::Weak;

use lb_store::AccountId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::session::SessionCore;

/// Registration of the identity observer. Dropping it unregisters.
#[derive(Debug)]
pub struct IdentitySubscription {
    handle: JoinHandle<()>,
}

impl IdentitySubscription {
    /// Unregister now rather than on drop.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for IdentitySubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub(crate) fn spawn_identity_watch(
    core: Weak<SessionCore>,
    mut identity: watch::Receiver<Option<AccountId>>,
) -> IdentitySubscription {
    // Only react to changes published after registration.
    let _ = identity.borrow_and_update();

    let handle = tokio::spawn(async move {
        while identity.changed().await.is_ok() {
            let current = identity.borrow_and_update().clone();
            let Some(session) = core.upgrade() else {
                return;
            };
            session.on_identity_change(current.as_ref());
        }
        debug!("identity source closed; treating as sign-out");
        if let Some(session) = core.upgrade() {
            session.on_identity_change(None);
        }
    });
    IdentitySubscription { handle }
}
