//! Error types for store operations.

use thiserror::Error;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A schema invariant was violated.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The row to update does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
