//! Cooperative cancellation for long-running evaluations.
//!
//! A [`CancellationToken`] is a cheap, clonable handle around a shared flag.
//! The grid evaluator checks it before starting each chunk, so a cancelled
//! run stops at the next chunk boundary instead of blocking until the whole
//! lattice is done.

// External dependencies
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Visible to every clone of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
