//! Repository interfaces.
//!
//! The scheduler depends only on these traits, so the persistence layer
//! can be swapped for the in-memory adapter in tests or for a database
//! adapter in deployment.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{PushSubscription, RecurrenceRule, ReminderMetadata, StoreError, Task};

/// Task records.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a new task.
    async fn create_task(&self, task: Task) -> Result<(), StoreError>;

    /// Look up a task by id. Absence is not an error.
    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, StoreError>;
}

/// Recurrence rules, one per template task.
#[async_trait]
pub trait RecurrenceRuleStore: Send + Sync {
    /// Persist a new rule. Fails if the task already has one.
    async fn insert_rule(&self, rule: RecurrenceRule) -> Result<(), StoreError>;

    /// All rules with `next_occurrence <= now`.
    async fn find_due_rules(&self, now: DateTime<Utc>) -> Result<Vec<RecurrenceRule>, StoreError>;

    /// Write back an updated rule.
    async fn save_rule(&self, rule: &RecurrenceRule) -> Result<(), StoreError>;

    /// Remove a rule (idempotent).
    async fn delete_rule(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Reminder metadata, one row per task.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Persist a new reminder. Fails if the task already has one.
    async fn insert_reminder(&self, reminder: ReminderMetadata) -> Result<(), StoreError>;

    /// All reminders that are due, unsent, and not snoozed past `now`.
    async fn find_due_reminders(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReminderMetadata>, StoreError>;

    /// Write back an updated reminder.
    async fn save_reminder(&self, reminder: &ReminderMetadata) -> Result<(), StoreError>;
}

/// Registered push endpoints.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Persist a new subscription. Fails on a duplicate endpoint.
    async fn insert_subscription(&self, subscription: PushSubscription) -> Result<(), StoreError>;

    /// All subscriptions registered by a user.
    async fn find_subscriptions(&self, user_id: &str) -> Result<Vec<PushSubscription>, StoreError>;

    /// Remove a subscription (idempotent). Used when an endpoint reports
    /// it is permanently gone.
    async fn delete_subscription(&self, id: Uuid) -> Result<(), StoreError>;
}
