//! Periodic eviction of idle request history.
//!
//! A pass looks at every key and removes the ones whose newest request is
//! older than the retention horizon. Logs are never trimmed here; pruning
//! inside the hour window is the limiter's job.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::SweeperConfig;
use crate::ratelimit::{Clock, LimiterKey, RateLimiter, SystemClock};

/// Errors that can occur while sweeping a single entry.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Entry is locked by an in-flight request")]
    Contended,

    #[error("Evaluating the entry panicked")]
    Panicked,
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Keys looked at
    pub examined: usize,
    /// Keys removed
    pub evicted: usize,
    /// Keys that could not be evaluated this pass
    pub skipped: usize,
}

/// Background cleanup for a [`RateLimiter`].
pub struct Sweeper<C: Clock = SystemClock> {
    limiter: Arc<RateLimiter<C>>,
    interval: Duration,
    retention: Duration,
}

impl<C: Clock> Sweeper<C> {
    /// Create a sweeper running every `interval` and evicting keys idle for
    /// longer than `retention`.
    pub fn new(limiter: Arc<RateLimiter<C>>, interval: Duration, retention: Duration) -> Self {
        Self {
            limiter,
            interval,
            retention,
        }
    }

    pub fn from_config(limiter: Arc<RateLimiter<C>>, config: &SweeperConfig) -> Self {
        Self::new(limiter, config.interval(), config.retention())
    }

    /// Run a single pass over the store.
    ///
    /// Works from a snapshot of the keys; anything created after the
    /// snapshot waits for the next pass. Failures on one key, panics
    /// included, never stop the pass.
    pub fn sweep_once(&self) -> SweepReport {
        let mut report = SweepReport::default();

        for key in self.limiter.store().keys() {
            report.examined += 1;
            // Shard and log locks do not poison, so unwinding out of the
            // predicate leaves the store usable.
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.sweep_entry(&key)))
                .unwrap_or(Err(SweepError::Panicked));

            match outcome {
                Ok(true) => report.evicted += 1,
                Ok(false) => {}
                Err(e @ SweepError::Contended) => {
                    report.skipped += 1;
                    debug!(key = %key, error = %e, "Skipping entry during sweep");
                }
                Err(e) => {
                    report.skipped += 1;
                    warn!(key = %key, error = %e, "Failed to sweep entry");
                }
            }
        }

        report
    }

    /// Evict one key if its newest request is past the retention horizon.
    fn sweep_entry(&self, key: &LimiterKey) -> Result<bool, SweepError> {
        let mut failure = None;

        let evicted = self.limiter.store().remove_if(key, |handle| {
            let Some(mut log) = handle.try_lock() else {
                failure = Some(SweepError::Contended);
                return false;
            };

            let now = self.limiter.clock().now();
            let idle = match log.newest() {
                Some(newest) => now.saturating_duration_since(newest) > self.retention,
                None => true,
            };

            if idle {
                log.detach();
            }
            idle
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(evicted),
        }
    }

    /// Sweep on a fixed interval until `shutdown` resolves.
    ///
    /// Shutdown is only observed between passes, so a running pass always
    /// completes. A pass that panics is logged and the schedule carries on.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        let sweeper = Arc::new(self);
        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + sweeper.interval,
            sweeper.interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            interval_secs = sweeper.interval.as_secs(),
            retention_secs = sweeper.retention.as_secs(),
            "Sweeper started"
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let pass = Arc::clone(&sweeper);
                    match tokio::task::spawn_blocking(move || pass.sweep_once()).await {
                        Ok(report) => info!(
                            examined = report.examined,
                            evicted = report.evicted,
                            skipped = report.skipped,
                            "Sweep pass complete"
                        ),
                        Err(e) => error!(error = %e, "Sweep pass failed"),
                    }
                }
            }
        }

        info!("Sweeper stopped");
    }

    /// Start sweeping on the current tokio runtime.
    pub fn spawn(self) -> SweeperHandle {
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(self.run_until(async move {
            let _ = rx.await;
        }));

        SweeperHandle { shutdown: tx, task }
    }
}

/// Handle to a spawned sweeper. Dropping it also stops the sweeper.
pub struct SweeperHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal shutdown and wait for the current pass, if any, to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            error!(error = %e, "Sweeper task ended abnormally");
        }
    }
}
