//! In-memory store adapter.
//!
//! Enforces the same schema invariants a database adapter would carry as
//! constraints: unique `task_id` per rule and per reminder, unique push
//! endpoint, and the reminder trigger requirement.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    PushSubscription, RecurrenceRule, RecurrenceRuleStore, ReminderMetadata, ReminderStore,
    StoreError, SubscriptionStore, Task, TaskStore,
};

/// In-memory implementation of all four repository traits.
#[derive(Default)]
pub struct MemoryStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
    rules: RwLock<HashMap<Uuid, RecurrenceRule>>,
    reminders: RwLock<HashMap<Uuid, ReminderMetadata>>,
    subscriptions: RwLock<HashMap<Uuid, PushSubscription>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all tasks (diagnostics and tests).
    pub async fn tasks(&self) -> Vec<Task> {
        self.tasks.read().await.values().cloned().collect()
    }

    /// Snapshot of all recurrence rules.
    pub async fn rules(&self) -> Vec<RecurrenceRule> {
        self.rules.read().await.values().cloned().collect()
    }

    /// Snapshot of all reminders.
    pub async fn reminders(&self) -> Vec<ReminderMetadata> {
        self.reminders.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, task: Task) -> Result<(), StoreError> {
        self.tasks.write().await.insert(task.id, task);
        Ok(())
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl RecurrenceRuleStore for MemoryStore {
    async fn insert_rule(&self, rule: RecurrenceRule) -> Result<(), StoreError> {
        let mut rules = self.rules.write().await;
        if rules.values().any(|r| r.task_id == rule.task_id) {
            return Err(StoreError::Constraint(format!(
                "task {} already has a recurrence rule",
                rule.task_id
            )));
        }
        rules.insert(rule.id, rule);
        Ok(())
    }

    async fn find_due_rules(&self, now: DateTime<Utc>) -> Result<Vec<RecurrenceRule>, StoreError> {
        Ok(self
            .rules
            .read()
            .await
            .values()
            .filter(|r| r.is_due(now))
            .cloned()
            .collect())
    }

    async fn save_rule(&self, rule: &RecurrenceRule) -> Result<(), StoreError> {
        let mut rules = self.rules.write().await;
        if !rules.contains_key(&rule.id) {
            return Err(StoreError::NotFound(format!("recurrence rule {}", rule.id)));
        }
        rules.insert(rule.id, rule.clone());
        Ok(())
    }

    async fn delete_rule(&self, id: Uuid) -> Result<(), StoreError> {
        self.rules.write().await.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ReminderStore for MemoryStore {
    async fn insert_reminder(&self, reminder: ReminderMetadata) -> Result<(), StoreError> {
        if reminder.due_date.is_none() && reminder.reminder_time.is_none() {
            return Err(StoreError::Constraint(
                "reminder requires a due_date or a reminder_time".to_string(),
            ));
        }
        let mut reminders = self.reminders.write().await;
        if reminders.values().any(|r| r.task_id == reminder.task_id) {
            return Err(StoreError::Constraint(format!(
                "task {} already has a reminder",
                reminder.task_id
            )));
        }
        reminders.insert(reminder.id, reminder);
        Ok(())
    }

    async fn find_due_reminders(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReminderMetadata>, StoreError> {
        Ok(self
            .reminders
            .read()
            .await
            .values()
            .filter(|r| r.is_due(now))
            .cloned()
            .collect())
    }

    async fn save_reminder(&self, reminder: &ReminderMetadata) -> Result<(), StoreError> {
        let mut reminders = self.reminders.write().await;
        if !reminders.contains_key(&reminder.id) {
            return Err(StoreError::NotFound(format!("reminder {}", reminder.id)));
        }
        reminders.insert(reminder.id, reminder.clone());
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn insert_subscription(&self, subscription: PushSubscription) -> Result<(), StoreError> {
        let mut subscriptions = self.subscriptions.write().await;
        if subscriptions
            .values()
            .any(|s| s.endpoint == subscription.endpoint)
        {
            return Err(StoreError::Constraint(format!(
                "endpoint {} is already registered",
                subscription.endpoint
            )));
        }
        subscriptions.insert(subscription.id, subscription);
        Ok(())
    }

    async fn find_subscriptions(&self, user_id: &str) -> Result<Vec<PushSubscription>, StoreError> {
        Ok(self
            .subscriptions
            .read()
            .await
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_subscription(&self, id: Uuid) -> Result<(), StoreError> {
        self.subscriptions.write().await.remove(&id);
        Ok(())
    }
}
