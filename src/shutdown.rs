use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/* ---------- */

/// One-way OPEN -> CLOSED latch shared by everything that ships orders.
///
/// Clones observe the same latch.
#[derive(Debug, Default)]
pub struct ShutdownLatch(Arc<AtomicBool>);

impl ShutdownLatch {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the shop. Returns `true` only for the call that closed it.
    #[inline]
    pub fn close(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Clone for ShutdownLatch {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
