//! Scheduler driver.
//!
//! Runs each registered sweep job on its own fixed interval. On startup
//! every job runs once before any timer starts, so events that came due
//! while the process was down are processed immediately. Ticks that
//! arrive while a job's previous sweep is still running are deferred,
//! never run concurrently with it; distinct jobs run independently.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::SweepJob;

/// Drives sweep jobs on fixed intervals.
pub struct SweepDriver {
    jobs: Vec<(Arc<dyn SweepJob>, Duration)>,
}

impl Default for SweepDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepDriver {
    /// Create a driver with no jobs.
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Register a job to run every `interval`.
    pub fn with_job(mut self, job: Arc<dyn SweepJob>, interval: Duration) -> Self {
        self.jobs.push((job, interval));
        self
    }

    /// Run until the shutdown channel flips to `true`.
    ///
    /// An in-flight sweep is allowed to finish its current work before
    /// the driver returns.
    pub async fn run(&self, shutdown_rx: watch::Receiver<bool>) {
        info!(jobs = self.jobs.len(), "scheduler starting");

        // Startup catch-up: one synchronous pass over every job before
        // the periodic timers begin.
        for (job, _) in &self.jobs {
            Self::run_once(job).await;
        }

        let mut handles = Vec::new();
        for (job, interval) in &self.jobs {
            let job = Arc::clone(job);
            let interval = *interval;
            let shutdown_rx = shutdown_rx.clone();
            handles.push(tokio::spawn(Self::job_loop(job, interval, shutdown_rx)));
        }

        for handle in handles {
            let _ = handle.await;
        }

        info!("scheduler shut down gracefully");
    }

    /// Periodic loop for one job.
    ///
    /// `MissedTickBehavior::Delay` gives the misfire grace: a tick that
    /// could not fire on time still runs when the task resumes instead of
    /// being dropped. Because the sweep is awaited inside the loop body,
    /// a tick that comes due mid-sweep is deferred until the sweep ends.
    async fn job_loop(
        job: Arc<dyn SweepJob>,
        interval: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the catch-up pass already
        // covered it.
        ticker.tick().await;

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!(job = job.name(), "sweep loop stopping");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    Self::run_once(&job).await;
                }
            }
        }
    }

    /// Run one sweep, absorbing its outcome into logs.
    async fn run_once(job: &Arc<dyn SweepJob>) {
        match job.run_at(Utc::now()).await {
            Ok(stats) => {
                debug!(
                    job = job.name(),
                    processed = stats.processed,
                    skipped = stats.skipped,
                    failed = stats.failed,
                    "sweep finished"
                );
            }
            Err(e) => {
                // The whole tick produced no effect; the next tick retries
                // the sweep from scratch.
                error!(job = job.name(), error = %e, "sweep failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SweepError, SweepStats};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Job that records invocations, optionally sleeping to simulate a
    /// slow sweep, and flags any overlapping execution.
    struct ProbeJob {
        runs: AtomicUsize,
        active: AtomicUsize,
        overlapped: AtomicBool,
        delay: Duration,
    }

    impl ProbeJob {
        fn new(delay: Duration) -> Self {
            Self {
                runs: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                overlapped: AtomicBool::new(false),
                delay,
            }
        }

        fn runs(&self) -> usize {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SweepJob for ProbeJob {
        fn name(&self) -> &'static str {
            "probe"
        }

        async fn run_at(&self, _now: DateTime<Utc>) -> Result<SweepStats, SweepError> {
            if self.active.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(SweepStats::default())
        }
    }

    async fn wait_for_runs(job: &Arc<ProbeJob>, at_least: usize) {
        while job.runs() < at_least {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn catch_up_runs_before_first_tick() {
        let job = Arc::new(ProbeJob::new(Duration::ZERO));
        let driver = SweepDriver::new().with_job(job.clone(), Duration::from_secs(60));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move { driver.run(shutdown_rx).await });

        // The catch-up pass runs without any clock movement
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(job.runs(), 1);

        // Not yet a full interval: no further runs
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(job.runs(), 1);

        // One interval after startup the first periodic tick fires
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(job.runs(), 2);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_sweep_defers_ticks_instead_of_overlapping() {
        // Sweep takes 3s, interval is 1s: ticks pile up while the sweep
        // runs and must be deferred, never run concurrently
        let job = Arc::new(ProbeJob::new(Duration::from_secs(3)));
        let driver = SweepDriver::new().with_job(job.clone(), Duration::from_secs(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move { driver.run(shutdown_rx).await });

        tokio::time::sleep(Duration::from_secs(20)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(!job.overlapped.load(Ordering::SeqCst), "sweeps overlapped");
        // With a 3s sweep on a 1s interval, 20s fits at most ~6 cycles;
        // far fewer than the 20 a fully parallel schedule would attempt
        assert!(job.runs() >= 2);
        assert!(job.runs() <= 8, "too many runs: {}", job.runs());
    }

    #[tokio::test(start_paused = true)]
    async fn jobs_tick_on_independent_intervals() {
        let fast = Arc::new(ProbeJob::new(Duration::ZERO));
        let slow = Arc::new(ProbeJob::new(Duration::ZERO));
        let driver = SweepDriver::new()
            .with_job(fast.clone(), Duration::from_secs(10))
            .with_job(slow.clone(), Duration::from_secs(60));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move { driver.run(shutdown_rx).await });

        wait_for_runs(&fast, 1).await;
        tokio::time::sleep(Duration::from_secs(61)).await;

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        // Catch-up plus six ticks for the fast job, catch-up plus one for
        // the slow one
        assert_eq!(fast.runs(), 7);
        assert_eq!(slow.runs(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_loops() {
        let job = Arc::new(ProbeJob::new(Duration::ZERO));
        let driver = SweepDriver::new().with_job(job.clone(), Duration::from_secs(5));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move { driver.run(shutdown_rx).await });
        wait_for_runs(&job, 1).await;

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
        let runs_at_shutdown = job.runs();

        // The clock keeps moving but nothing runs anymore
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(job.runs(), runs_at_shutdown);
    }
}
