//! Scoped "operation in flight" indicator.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts in-flight operations. `is_busy` is the view layer's `loading` flag.
#[derive(Debug, Default)]
pub(crate) struct BusyCounter(AtomicUsize);

impl BusyCounter {
    /// Mark an operation as started; it ends when the guard is dropped,
    /// whichever way the operation exits.
    pub(crate) fn acquire(&self) -> BusyGuard<'_> {
        self.0.fetch_add(1, Ordering::AcqRel);
        BusyGuard(self)
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire) > 0
    }
}

#[must_use = "the operation is only marked busy while the guard is alive"]
pub(crate) struct BusyGuard<'a>(&'a BusyCounter);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0 .0.fetch_sub(1, Ordering::AcqRel);
    }
}
