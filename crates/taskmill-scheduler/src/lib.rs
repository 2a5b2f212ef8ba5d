//! Recurrence and reminder sweep engine for Taskmill.
//!
//! This crate provides the periodic background subsystem that:
//! - Materializes new task instances from recurrence rules when they
//!   become due
//! - Delivers due reminder notifications at most once per due event
//! - Survives restarts: a startup catch-up sweep processes everything
//!   that came due while the process was down

mod driver;
mod error;
mod recurrence;
mod sweep;

pub use driver::SweepDriver;
pub use error::SweepError;
pub use recurrence::next_occurrence;
pub use sweep::{RecurrenceSweep, ReminderSweep, SweepJob, SweepStats};
