//! Shared run/stop flag.
//!
//! Cleared exactly once by the shutdown sequencer and polled by the capture
//! worker at the top of every cycle. There is no way back to running.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable handle to a single "still running" bit.
#[derive(Debug, Clone)]
pub struct LifecycleFlag {
    running: Arc<AtomicBool>,
}

impl LifecycleFlag {
    /// New flag in the running state.
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// `true` until [`stop`](Self::stop) has been called on any clone.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signal stop. Returns `true` if this call did the transition.
    pub fn stop(&self) -> bool {
        self.running.swap(false, Ordering::SeqCst)
    }
}

impl Default for LifecycleFlag {
    fn default() -> Self {
        Self::new()
    }
}
