//! Cooperative stop requests.
//!
//! A `StopFlag` is a cloneable one-way flag. The binary wires the global flag
//! to Ctrl-C; batch loops check it before starting each item.
//!
//! Notes:
//! - Relaxed atomics are sufficient for a one-way "stop" flag.
//! - `request()` is safe to call from signal handlers.

use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a cooperative stop (idempotent).
    #[inline]
    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clear the flag, e.g. after an interrupted batch in the interactive shell.
    #[inline]
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Process-wide flag set by the Ctrl-C handler.
pub fn global() -> &'static StopFlag {
    static GLOBAL: OnceLock<StopFlag> = OnceLock::new();
    GLOBAL.get_or_init(StopFlag::new)
}

/// Request a stop on the process-wide flag.
#[inline]
pub fn request() {
    global().request();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let a = StopFlag::new();
        let b = a.clone();
        assert!(!b.is_requested());
        a.request();
        assert!(b.is_requested());
        b.reset();
        assert!(!a.is_requested());
    }
}
