//! Cooperative cancellation for paginated walks.
//!
//! A `CancelSignal` is a cheap, cloneable handle around a shared flag.
//! Walkers check it between pages, never mid-page.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    flag: Arc<AtomicBool>,
}

impl CancelSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let signal = CancelSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_cancelled());

        signal.cancel();
        assert!(observer.is_cancelled());

        signal.cancel();
        assert!(observer.is_cancelled());
    }
}
