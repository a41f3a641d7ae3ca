//! Cooperative cancellation for prune phases.
//!
//! A `CancelToken` is a shared flag checked at I/O boundaries: backend
//! listing, repacking, index writes, and file deletion. In-memory planning
//! arithmetic does not poll the token. Cancellation between executor steps
//! leaves the repository in the same recoverable states as a step failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag.
///
/// Clones observe the same flag; `cancel` is sticky and cannot be undone.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
