//! Sweep jobs.
//!
//! Each sweep is one bounded unit of work: query the due rows, process
//! them sequentially, and write back per row. A failure on one row is
//! logged and skipped so the rest of the batch still makes progress; the
//! failed row stays due and the next tick retries it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use taskmill_push::{NotificationPayload, NotificationSender, PushError};
use taskmill_store::{
    RecurrenceRule, RecurrenceRuleStore, ReminderMetadata, ReminderStore, SubscriptionStore, Task,
    TaskStore,
};

use crate::{SweepError, next_occurrence};

/// Outcome counts for one sweep invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Rows fully processed.
    pub processed: usize,
    /// Rows skipped (nothing to do for them anymore).
    pub skipped: usize,
    /// Rows that failed and will be retried next tick.
    pub failed: usize,
}

/// A periodic job the driver can run.
#[async_trait]
pub trait SweepJob: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Run one sweep with `now` as the due threshold.
    ///
    /// An error here means the sweep could not run at all (store
    /// unreachable); per-row failures are absorbed into the stats.
    async fn run_at(&self, now: DateTime<Utc>) -> Result<SweepStats, SweepError>;
}

enum RuleOutcome {
    Advanced,
    Retired,
    TemplateMissing,
}

/// Materializes task instances from due recurrence rules.
pub struct RecurrenceSweep {
    tasks: Arc<dyn TaskStore>,
    rules: Arc<dyn RecurrenceRuleStore>,
}

impl RecurrenceSweep {
    pub fn new(tasks: Arc<dyn TaskStore>, rules: Arc<dyn RecurrenceRuleStore>) -> Self {
        Self { tasks, rules }
    }

    /// Create the task instance for one due rule and advance or retire
    /// the rule.
    async fn process_rule(
        &self,
        rule: &RecurrenceRule,
        now: DateTime<Utc>,
    ) -> Result<RuleOutcome, SweepError> {
        let Some(template) = self.tasks.get_task(rule.task_id).await? else {
            // Cascade delete should have removed the rule with its task;
            // leave the row alone and just skip it.
            warn!(
                rule_id = %rule.id,
                task_id = %rule.task_id,
                "template task missing for recurrence rule, skipping"
            );
            return Ok(RuleOutcome::TemplateMissing);
        };

        let instance = Task::from_template(&template, now);
        let instance_id = instance.id;
        self.tasks.create_task(instance).await?;

        match next_occurrence(rule, now) {
            Some(next) => {
                let mut updated = rule.clone();
                updated.next_occurrence = next;
                self.rules.save_rule(&updated).await?;
                debug!(
                    rule_id = %rule.id,
                    task_id = %instance_id,
                    next_occurrence = %next,
                    "materialized recurring task"
                );
                Ok(RuleOutcome::Advanced)
            }
            None => {
                self.rules.delete_rule(rule.id).await?;
                info!(
                    rule_id = %rule.id,
                    task_id = %instance_id,
                    "recurrence reached its end date, rule removed"
                );
                Ok(RuleOutcome::Retired)
            }
        }
    }
}

#[async_trait]
impl SweepJob for RecurrenceSweep {
    fn name(&self) -> &'static str {
        "recurrence"
    }

    async fn run_at(&self, now: DateTime<Utc>) -> Result<SweepStats, SweepError> {
        let due = self.rules.find_due_rules(now).await?;
        if due.is_empty() {
            debug!("no due recurrence rules");
            return Ok(SweepStats::default());
        }

        let mut stats = SweepStats::default();
        for rule in &due {
            match self.process_rule(rule, now).await {
                Ok(RuleOutcome::Advanced | RuleOutcome::Retired) => stats.processed += 1,
                Ok(RuleOutcome::TemplateMissing) => stats.skipped += 1,
                Err(e) => {
                    error!(
                        rule_id = %rule.id,
                        error = %e,
                        "failed to process recurrence rule, will retry next tick"
                    );
                    stats.failed += 1;
                }
            }
        }

        info!(
            processed = stats.processed,
            skipped = stats.skipped,
            failed = stats.failed,
            "recurrence sweep complete"
        );
        Ok(stats)
    }
}

enum ReminderOutcome {
    Delivered,
    Orphaned,
    NoRecipient,
}

/// Delivers notifications for due reminders.
pub struct ReminderSweep {
    tasks: Arc<dyn TaskStore>,
    reminders: Arc<dyn ReminderStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    sender: Arc<dyn NotificationSender>,
}

impl ReminderSweep {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        reminders: Arc<dyn ReminderStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        sender: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            tasks,
            reminders,
            subscriptions,
            sender,
        }
    }

    /// Deliver one due reminder and mark it sent.
    ///
    /// The sent marker is flipped once every subscription has been
    /// attempted, regardless of per-subscription outcome; a reminder
    /// event fires at most once no matter how delivery went.
    async fn process_reminder(
        &self,
        reminder: &ReminderMetadata,
        now: DateTime<Utc>,
    ) -> Result<ReminderOutcome, SweepError> {
        let mut reminder = reminder.clone();

        let Some(task) = self.tasks.get_task(reminder.task_id).await? else {
            // Orphaned reminder: nothing to notify about, but mark it
            // sent so it is not re-evaluated every tick forever.
            warn!(
                reminder_id = %reminder.id,
                task_id = %reminder.task_id,
                "task missing for reminder, marking sent"
            );
            reminder.notification_sent = true;
            self.reminders.save_reminder(&reminder).await?;
            return Ok(ReminderOutcome::Orphaned);
        };

        let subscriptions = self.subscriptions.find_subscriptions(&task.user_id).await?;
        if subscriptions.is_empty() {
            debug!(
                reminder_id = %reminder.id,
                user_id = %task.user_id,
                "no push subscriptions, marking reminder sent"
            );
            reminder.notification_sent = true;
            self.reminders.save_reminder(&reminder).await?;
            return Ok(ReminderOutcome::NoRecipient);
        }

        let payload = NotificationPayload::for_task(&task);
        for subscription in subscriptions {
            match self.sender.send(&subscription, &payload).await {
                Ok(()) => {}
                Err(PushError::SubscriptionGone) => {
                    info!(
                        subscription_id = %subscription.id,
                        endpoint = %subscription.endpoint,
                        "push endpoint gone, removing subscription"
                    );
                    if let Err(e) = self.subscriptions.delete_subscription(subscription.id).await {
                        error!(
                            subscription_id = %subscription.id,
                            error = %e,
                            "failed to remove stale subscription"
                        );
                    }
                }
                Err(e) => {
                    // Transient: keep the subscription for the next event.
                    error!(
                        subscription_id = %subscription.id,
                        endpoint = %subscription.endpoint,
                        error = %e,
                        "push delivery failed"
                    );
                }
            }
        }

        reminder.notification_sent = true;
        self.reminders.save_reminder(&reminder).await?;
        info!(
            reminder_id = %reminder.id,
            task_id = %task.id,
            user_id = %task.user_id,
            delivered_at = %now,
            "reminder delivered"
        );
        Ok(ReminderOutcome::Delivered)
    }
}

#[async_trait]
impl SweepJob for ReminderSweep {
    fn name(&self) -> &'static str {
        "reminder"
    }

    async fn run_at(&self, now: DateTime<Utc>) -> Result<SweepStats, SweepError> {
        let due = self.reminders.find_due_reminders(now).await?;
        if due.is_empty() {
            debug!("no due reminders");
            return Ok(SweepStats::default());
        }

        let mut stats = SweepStats::default();
        for reminder in &due {
            match self.process_reminder(reminder, now).await {
                Ok(ReminderOutcome::Delivered) => stats.processed += 1,
                Ok(ReminderOutcome::Orphaned | ReminderOutcome::NoRecipient) => stats.skipped += 1,
                Err(e) => {
                    error!(
                        reminder_id = %reminder.id,
                        error = %e,
                        "failed to process reminder, will retry next tick"
                    );
                    stats.failed += 1;
                }
            }
        }

        info!(
            processed = stats.processed,
            skipped = stats.skipped,
            failed = stats.failed,
            "reminder sweep complete"
        );
        Ok(stats)
    }
}
