//! Error types for the sweep engine.

use thiserror::Error;

/// Errors that abort an entire sweep tick.
///
/// Per-row failures are logged and skipped inside the sweep; only
/// sweep-level failures (the due-row query itself failing) surface here.
/// The driver logs them and retries on the next tick.
#[derive(Debug, Error)]
pub enum SweepError {
    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] taskmill_store::StoreError),
}
