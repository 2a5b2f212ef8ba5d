//! Push delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use taskmill_store::{PushSubscription, Task};

use crate::{PushError, VapidSigner};

/// How long the push service may hold an undelivered notification.
const TTL_SECS: u32 = 86_400;

/// Notification content delivered to a push endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    /// Collapse key so repeated deliveries for one task replace each other.
    pub tag: String,
    pub data: PayloadData,
}

/// Structured data carried alongside the visible notification.
#[derive(Debug, Clone, Serialize)]
pub struct PayloadData {
    pub task_id: Uuid,
}

impl NotificationPayload {
    /// Build the reminder payload for a task.
    pub fn for_task(task: &Task) -> Self {
        Self {
            title: "Task Reminder".to_string(),
            body: format!("Reminder: {}", task.title),
            tag: task.id.to_string(),
            data: PayloadData { task_id: task.id },
        }
    }
}

/// Delivers a payload to a registered push endpoint.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Deliver `payload` to `subscription`.
    ///
    /// Returns [`PushError::SubscriptionGone`] when the endpoint reports
    /// it is permanently invalid; any other error is transient.
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), PushError>;
}

/// Web Push sender: VAPID-signed POST to the subscription endpoint.
pub struct WebPushSender {
    http: Client,
    vapid: VapidSigner,
}

impl WebPushSender {
    /// Create a sender with the given VAPID credentials.
    pub fn new(vapid: VapidSigner) -> Self {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self { http, vapid }
    }
}

#[async_trait]
impl NotificationSender for WebPushSender {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), PushError> {
        let authorization = self.vapid.authorization(&subscription.endpoint)?;
        let body = serde_json::to_vec(payload)?;

        let response = self
            .http
            .post(&subscription.endpoint)
            .header(header::AUTHORIZATION, authorization)
            .header(header::CONTENT_TYPE, "application/json")
            .header("TTL", TTL_SECS.to_string())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        match status {
            s if s.is_success() => {
                debug!(endpoint = %subscription.endpoint, "push delivered");
                Ok(())
            }
            // 410 is the specified signal; some push services use 404 for
            // expired subscriptions.
            StatusCode::GONE | StatusCode::NOT_FOUND => Err(PushError::SubscriptionGone),
            _ => {
                let message = response.text().await.unwrap_or_default();
                Err(PushError::Rejected { status, message })
            }
        }
    }
}
