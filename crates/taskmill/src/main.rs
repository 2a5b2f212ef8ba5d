//! Taskmill: recurrence and reminder scheduling daemon.
//!
//! Runs the two sweep jobs on independent intervals:
//! - Recurrence sweep: materializes task instances from due rules
//! - Reminder sweep: delivers due reminder notifications via Web Push

use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod daemon;

#[derive(Parser)]
#[command(name = "taskmill")]
#[command(about = "Recurrence and reminder scheduling daemon", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler daemon
    Daemon {
        /// Recurrence sweep interval in minutes
        #[arg(long, env = "TASKMILL_RECURRENCE_INTERVAL_MINUTES", default_value = "5")]
        recurrence_interval: u64,

        /// Reminder sweep interval in seconds (reminders are
        /// time-sensitive and need finer granularity)
        #[arg(long, env = "TASKMILL_REMINDER_INTERVAL_SECONDS", default_value = "60")]
        reminder_interval: u64,

        /// VAPID private key (base64url-encoded raw P-256 scalar)
        #[arg(long, env = "VAPID_PRIVATE_KEY")]
        vapid_private_key: String,

        /// VAPID contact claim
        #[arg(long, env = "VAPID_CONTACT", default_value = "mailto:admin@example.com")]
        vapid_contact: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "taskmill=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon {
            recurrence_interval,
            reminder_interval,
            vapid_private_key,
            vapid_contact,
        } => {
            daemon::run(daemon::DaemonConfig {
                recurrence_interval_minutes: recurrence_interval,
                reminder_interval_seconds: reminder_interval,
                vapid_private_key,
                vapid_contact,
            })
            .await
        }
    }
}
