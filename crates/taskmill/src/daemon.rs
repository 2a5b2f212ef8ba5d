//! Daemon command: composition root for the scheduler.
//!
//! Builds the stores, the push sender, and the sweep driver, then runs
//! until ctrl-c. A single driver instance owns both sweep loops; in-flight
//! sweeps finish their current row before the process exits.

use std::sync::Arc;
use std::time::Duration;

use miette::Result;
use tokio::sync::watch;
use tracing::{error, info};

use taskmill_push::{VapidSigner, WebPushSender};
use taskmill_scheduler::{RecurrenceSweep, ReminderSweep, SweepDriver};
use taskmill_store::MemoryStore;

/// Configuration for the daemon.
pub struct DaemonConfig {
    pub recurrence_interval_minutes: u64,
    pub reminder_interval_seconds: u64,
    pub vapid_private_key: String,
    pub vapid_contact: String,
}

/// Run the scheduler daemon until ctrl-c.
pub async fn run(config: DaemonConfig) -> Result<()> {
    // The in-memory adapter is the only bundled store; a database-backed
    // adapter plugs in behind the same repository traits.
    let store = Arc::new(MemoryStore::new());

    let vapid = VapidSigner::new(&config.vapid_private_key, config.vapid_contact)
        .map_err(|e| miette::miette!("{}", e))?;
    let sender = Arc::new(WebPushSender::new(vapid));

    let recurrence = Arc::new(RecurrenceSweep::new(store.clone(), store.clone()));
    let reminders = Arc::new(ReminderSweep::new(
        store.clone(),
        store.clone(),
        store.clone(),
        sender,
    ));

    let driver = SweepDriver::new()
        .with_job(
            recurrence,
            Duration::from_secs(config.recurrence_interval_minutes * 60),
        )
        .with_job(
            reminders,
            Duration::from_secs(config.reminder_interval_seconds),
        );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
            }
            Err(e) => {
                error!(error = %e, "failed to listen for shutdown signal");
            }
        }
        let _ = shutdown_tx.send(true);
    });

    info!(
        recurrence_interval_minutes = config.recurrence_interval_minutes,
        reminder_interval_seconds = config.reminder_interval_seconds,
        "starting taskmill daemon"
    );

    driver.run(shutdown_rx).await;
    Ok(())
}
