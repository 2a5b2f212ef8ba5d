//! Web Push notification delivery for Taskmill.
//!
//! Provides the [`NotificationSender`] seam the reminder sweep delivers
//! through, and [`WebPushSender`], which performs VAPID-signed requests
//! against a subscription's push-service endpoint.
//!
//! The one failure-handling decision that matters here: HTTP 410 (and 404
//! from some push services) means the endpoint will never accept another
//! delivery and the subscription must be deleted; everything else is
//! transient and the subscription is kept for a future attempt.

mod error;
mod sender;
mod vapid;

pub use error::PushError;
pub use sender::{NotificationPayload, NotificationSender, PayloadData, WebPushSender};
pub use vapid::VapidSigner;
