//! Data model and repository interfaces for Taskmill.
//!
//! This crate provides:
//! - The persisted entities: tasks, recurrence rules, reminder metadata,
//!   and push subscriptions
//! - Repository traits the scheduler depends on
//! - An in-memory adapter that enforces the schema invariants

mod error;
mod memory;
mod store;
mod types;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{RecurrenceRuleStore, ReminderStore, SubscriptionStore, TaskStore};
pub use types::{
    Frequency, PushSubscription, RecurrenceRule, ReminderMetadata, SubscriptionKeys, Task,
    TaskPriority, TaskStatus,
};
