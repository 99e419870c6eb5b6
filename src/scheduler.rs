// src/scheduler.rs
use metrics::{counter, gauge};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::fetch::FetchError;
use crate::monitor::Watch;
use crate::notify::{broadcast, BroadcastReport, Destination, Notifier};

#[derive(Debug)]
pub enum TickOutcome {
    Unchanged,
    Changed(BroadcastReport),
    Failed(FetchError),
}

#[derive(Debug, thiserror::Error)]
#[error("poll interval must be greater than zero")]
pub struct ZeroInterval;

impl TickOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, TickOutcome::Changed(_))
    }
}

/// Fixed-interval poll loop: fetch, compare, and broadcast on change.
///
/// Nothing that goes wrong inside a tick stops the loop; only the
/// cancellation token does, and it is checked between ticks.
pub struct Scheduler {
    interval: Duration,
    destinations: Vec<Destination>,
    notifier: Arc<dyn Notifier>,
}

impl Scheduler {
    pub fn new(
        interval: Duration,
        destinations: Vec<Destination>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ZeroInterval> {
        if interval.is_zero() {
            return Err(ZeroInterval);
        }
        Ok(Self {
            interval,
            destinations,
            notifier,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// One poll-compare-notify pass.
    pub async fn tick(&self, watch: &dyn Watch) -> TickOutcome {
        counter!("watch_ticks_total").increment(1);
        gauge!("watch_last_tick_ts").set(chrono::Utc::now().timestamp() as f64);

        match watch.poll().await {
            Ok(None) => {
                tracing::debug!(source = watch.label(), "no change");
                TickOutcome::Unchanged
            }
            Ok(Some(message)) => {
                counter!("watch_changes_total").increment(1);
                tracing::info!(source = watch.label(), "change detected, notifying");
                let report = broadcast(self.notifier.as_ref(), &self.destinations, &message).await;
                tracing::info!(
                    source = watch.label(),
                    delivered = report.successes.len(),
                    failed = report.errors.len(),
                    "broadcast finished"
                );
                TickOutcome::Changed(report)
            }
            Err(e) => {
                counter!("watch_fetch_errors_total", "kind" => e.kind()).increment(1);
                tracing::warn!(source = watch.label(), url = watch.url(), error = %e, "tick failed");
                TickOutcome::Failed(e)
            }
        }
    }

    /// Seed the baseline, then tick every `interval` until `cancel` fires.
    pub async fn run(&self, watch: Arc<dyn Watch>, cancel: CancellationToken) {
        if cancel.is_cancelled() {
            return;
        }

        match watch.poll().await {
            Ok(None) => tracing::info!(source = watch.label(), "baseline established"),
            // only possible with a preloaded snapshot; never announced
            Ok(Some(_)) => tracing::info!(source = watch.label(), "baseline differs from preloaded snapshot"),
            Err(e) => {
                counter!("watch_fetch_errors_total", "kind" => e.kind()).increment(1);
                tracing::warn!(source = watch.label(), error = %e, "seed fetch failed; first successful tick becomes baseline");
            }
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately; the seed already covered it
        ticker.tick().await;

        tracing::info!(source = watch.label(), every = ?self.interval, "monitor started");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.tick(watch.as_ref()).await;
        }
        tracing::info!(source = watch.label(), "monitor stopped");
    }

    pub fn spawn(self: Arc<Self>, watch: Arc<dyn Watch>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(watch, cancel).await })
    }
}
