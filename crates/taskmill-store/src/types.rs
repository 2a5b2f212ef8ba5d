//! Persisted entity types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::StoreError;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has not been completed yet.
    #[default]
    Pending,
    /// Task has been completed.
    Complete,
}

/// Priority of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// A task record.
///
/// Tasks are owned by the task store; the scheduler only reads templates
/// and creates new instances from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    /// Owner of the task.
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new pending task.
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            title: title.into(),
            description: None,
            status: TaskStatus::Pending,
            priority: TaskPriority::default(),
            category_id: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Materialize a new instance from a recurring template.
    ///
    /// The instance copies title, description, priority, category, and
    /// owner from the template, and always starts pending.
    pub fn from_template(template: &Task, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: template.user_id.clone(),
            title: template.title.clone(),
            description: template.description.clone(),
            status: TaskStatus::Pending,
            priority: template.priority,
            category_id: template.category_id,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

/// How often a recurring task repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// A recurrence rule attached to a template task.
///
/// At most one rule exists per task. A rule always has a next occurrence;
/// when the series ends the rule is deleted rather than stored with no
/// next occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub id: Uuid,
    /// Template task this rule belongs to (unique per task).
    pub task_id: Uuid,
    pub frequency: Frequency,
    /// Number of periods between occurrences (>= 1).
    pub interval: u32,
    /// Weekday selection for weekly rules (0=Mon .. 6=Sun). Stored for
    /// user edits but not consulted by the occurrence arithmetic.
    pub days_of_week: Option<Vec<u8>>,
    /// Specific day for monthly rules (1..=31).
    pub day_of_month: Option<u8>,
    /// Last date (inclusive) on which an occurrence may fall.
    pub end_date: Option<NaiveDate>,
    /// When the next task instance should be created.
    pub next_occurrence: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RecurrenceRule {
    /// Create a validated rule with the given first occurrence.
    pub fn new(
        task_id: Uuid,
        frequency: Frequency,
        interval: u32,
        next_occurrence: DateTime<Utc>,
    ) -> Result<Self, StoreError> {
        if interval < 1 {
            return Err(StoreError::Constraint(
                "recurrence interval must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            task_id,
            frequency,
            interval,
            days_of_week: None,
            day_of_month: None,
            end_date: None,
            next_occurrence,
            created_at: Utc::now(),
        })
    }

    /// Restrict a weekly rule to specific weekdays (0=Mon .. 6=Sun).
    pub fn with_days_of_week(mut self, days: Vec<u8>) -> Result<Self, StoreError> {
        if days.iter().any(|d| *d > 6) {
            return Err(StoreError::Constraint(
                "days_of_week entries must be in 0..=6".to_string(),
            ));
        }
        self.days_of_week = Some(days);
        Ok(self)
    }

    /// Pin a monthly rule to a specific day of the month (1..=31).
    pub fn with_day_of_month(mut self, day: u8) -> Result<Self, StoreError> {
        if !(1..=31).contains(&day) {
            return Err(StoreError::Constraint(
                "day_of_month must be in 1..=31".to_string(),
            ));
        }
        self.day_of_month = Some(day);
        Ok(self)
    }

    /// Stop producing occurrences after this date (inclusive).
    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Check whether this rule is due for materialization.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_occurrence <= now
    }
}

/// Reminder metadata attached to a task.
///
/// At most one reminder exists per task, and at least one of `due_date` /
/// `reminder_time` is always set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderMetadata {
    pub id: Uuid,
    /// Task this reminder belongs to (unique per task).
    pub task_id: Uuid,
    pub due_date: Option<DateTime<Utc>>,
    /// When to deliver the notification.
    pub reminder_time: Option<DateTime<Utc>>,
    /// Durable idempotency marker: flips false -> true exactly once per
    /// reminder_time value.
    pub notification_sent: bool,
    pub snooze_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ReminderMetadata {
    /// Create a validated reminder. At least one of `due_date` and
    /// `reminder_time` must be supplied.
    pub fn new(
        task_id: Uuid,
        due_date: Option<DateTime<Utc>>,
        reminder_time: Option<DateTime<Utc>>,
    ) -> Result<Self, StoreError> {
        if due_date.is_none() && reminder_time.is_none() {
            return Err(StoreError::Constraint(
                "reminder requires a due_date or a reminder_time".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            task_id,
            due_date,
            reminder_time,
            notification_sent: false,
            snooze_until: None,
            created_at: Utc::now(),
        })
    }

    /// Set a new reminder time, resetting the sent marker so the new
    /// time fires again.
    pub fn rearm(&mut self, reminder_time: DateTime<Utc>) {
        self.reminder_time = Some(reminder_time);
        self.notification_sent = false;
    }

    /// Suppress delivery until the given time.
    pub fn snooze(&mut self, until: DateTime<Utc>) {
        self.snooze_until = Some(until);
    }

    /// Check whether this reminder should be delivered now.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if self.notification_sent {
            return false;
        }
        let Some(reminder_time) = self.reminder_time else {
            return false;
        };
        if reminder_time > now {
            return false;
        }
        match self.snooze_until {
            Some(until) => until <= now,
            None => true,
        }
    }
}

/// Encryption keys of a browser push subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    /// Client public key (base64url).
    pub p256dh: String,
    /// Shared auth secret (base64url).
    pub auth: String,
}

/// A registered Web Push endpoint for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscription {
    pub id: Uuid,
    pub user_id: String,
    /// Push service endpoint URL (unique).
    pub endpoint: String,
    pub keys: SubscriptionKeys,
    pub created_at: DateTime<Utc>,
}

impl PushSubscription {
    /// Register a new subscription.
    pub fn new(
        user_id: impl Into<String>,
        endpoint: impl Into<String>,
        keys: SubscriptionKeys,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            endpoint: endpoint.into(),
            keys,
            created_at: Utc::now(),
        }
    }
}
