//! Cooperative cancellation for long-running key generation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Shared flag a host can set to abort an in-flight [`newkeys_with`] call.
///
/// Prime search polls the token between candidate draws and between
/// Miller-Rabin rounds, so cancellation latency is bounded by a single
/// witness test. Cloning shares the underlying flag.
///
/// [`newkeys_with`]: crate::key::newkeys_with
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Bail out with [`Error::Cancelled`] if the (optional) token was tripped.
pub(crate) fn check(cancel: Option<&CancelToken>) -> Result<()> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(Error::Cancelled),
        _ => Ok(()),
    }
}
