// src/bootstrap.rs
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::WatchConfig;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::ladder::{LadderClient, LadderDetector, LadderQuery};
use crate::monitor::{LadderMonitor, PageMonitor, Watch};
use crate::notify::{broadcast, DiscordNotifier, LogNotifier, Notifier};
use crate::scheduler::Scheduler;
use crate::snapshot::SnapshotStore;

/// Everything the binary needs, assembled from config.
pub struct WatchRuntime {
    pub cfg: WatchConfig,
    pub notifier: Arc<dyn Notifier>,
    pub scheduler: Arc<Scheduler>,
    pub watches: Vec<Arc<dyn Watch>>,
}

impl WatchRuntime {
    pub fn from_config(cfg: WatchConfig) -> anyhow::Result<Self> {
        let notifier = build_notifier(&cfg);
        let watches = build_watches(&cfg)?;
        let scheduler = Arc::new(Scheduler::new(
            cfg.interval,
            cfg.destinations.clone(),
            Arc::clone(&notifier),
        )?);
        // Safe diagnostics: counts only, never webhook urls
        info!(
            "watch cfg loaded: watches={}, destinations={}, webhooks={}, interval={:?}",
            watches.len(),
            cfg.destinations.len(),
            cfg.discord.webhooks.len(),
            cfg.interval
        );
        Ok(Self {
            cfg,
            notifier,
            scheduler,
            watches,
        })
    }

    /// Startup "ready" message, when enabled.
    pub async fn announce_ready(&self) {
        if !self.cfg.announce_ready {
            return;
        }
        let msg = format!("metro-watch is up, watching {} source(s).", self.watches.len());
        let report = broadcast(self.notifier.as_ref(), &self.cfg.destinations, &msg).await;
        if !report.all_delivered() {
            warn!(failed = report.errors.len(), "ready announcement partially failed");
        }
    }

    /// One scheduler task per watch, all stopped by the same token.
    pub fn spawn_all(&self, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        self.watches
            .iter()
            .map(|w| Arc::clone(&self.scheduler).spawn(Arc::clone(w), cancel.clone()))
            .collect()
    }
}

pub fn build_notifier(cfg: &WatchConfig) -> Arc<dyn Notifier> {
    if cfg.discord.webhooks.is_empty() {
        warn!("no discord webhooks configured; change messages go to the log only");
        return Arc::new(LogNotifier);
    }
    Arc::new(DiscordNotifier::new(cfg.discord.webhooks.clone()).with_timeout(cfg.http_timeout))
}

pub fn build_watches(cfg: &WatchConfig) -> anyhow::Result<Vec<Arc<dyn Watch>>> {
    let mut watches: Vec<Arc<dyn Watch>> = Vec::new();

    let page_fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(cfg.http_timeout)?);
    for page in &cfg.pages {
        let mut m = PageMonitor::new(page.url.clone(), Arc::clone(&page_fetcher));
        if let Some(label) = &page.label {
            m = m.labelled(label.clone());
        }
        watches.push(Arc::new(m));
    }

    if let Some(l) = &cfg.ladder {
        watches.push(Arc::new(build_ladder_monitor(cfg, l)?));
    }

    Ok(watches)
}

pub fn build_ladder_monitor(
    cfg: &WatchConfig,
    l: &crate::config::LadderWatchConfig,
) -> anyhow::Result<LadderMonitor> {
    let client = LadderClient::new(
        cfg.http_timeout,
        l.page_id.clone(),
        LadderQuery::division(l.filter_by_formula.clone()),
    )?;
    let detector = LadderDetector::new().with_team_name(l.compare_team_name);
    Ok(
        LadderMonitor::with_store(l.endpoint(), Arc::new(client), SnapshotStore::with_detector(detector))
            .labelled(l.link.clone()),
    )
}
