//! Auto-lock: a single rescheduleable deadline.
//!
//! Each `reset` aborts the pending firing and spawns a new one. Firings carry
//! the generation they were scheduled under; the session only honours a
//! firing whose generation is still current, so a firing that lost a race
//! with `reset` or `cancel` is a no-op.

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};

use crate::settings::MAX_AUTO_LOCK_SECS;

#[derive(Debug)]
pub(crate) struct AutoLockTimer {
    period: Duration,
    deadline: Option<Instant>,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl AutoLockTimer {
    /// `period` is capped at `MAX_AUTO_LOCK_SECS` so the deadline is always
    /// representable.
    pub(crate) fn new(period: Duration) -> Self {
        Self {
            period: period.min(Duration::from_secs(MAX_AUTO_LOCK_SECS)),
            deadline: None,
            generation: 0,
            pending: None,
        }
    }

    /// Push the deadline to now + period. `on_fire` runs once, with the
    /// generation of this schedule, if nothing resets or cancels first.
    /// Must be called from within a Tokio runtime.
    pub(crate) fn reset<F>(&mut self, on_fire: F)
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        let deadline = Instant::now() + self.period;
        self.deadline = Some(deadline);
        self.pending = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            on_fire(generation);
        }));
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.deadline = None;
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.pending.is_some() && self.generation == generation
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

impl Drop for AutoLockTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
