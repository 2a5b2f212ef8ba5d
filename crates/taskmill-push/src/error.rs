//! Error types for push delivery.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when delivering a push notification.
#[derive(Debug, Error)]
pub enum PushError {
    /// The endpoint reported it will never accept further deliveries.
    /// The caller must delete the subscription.
    #[error("push endpoint is gone")]
    SubscriptionGone,

    /// The push service rejected the delivery for a retryable reason.
    #[error("push service rejected delivery ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    /// The request could not be completed (network error, timeout).
    #[error("push request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The payload could not be encoded.
    #[error("failed to encode payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// VAPID credentials are malformed or signing failed.
    #[error("VAPID error: {0}")]
    Vapid(String),
}
