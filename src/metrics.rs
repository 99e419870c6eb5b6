use anyhow::Context;
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("watch_ticks_total", "Scheduled polls of a monitored source.");
        describe_counter!(
            "watch_fetch_errors_total",
            "Polls that failed to fetch or decode, by error kind."
        );
        describe_counter!("watch_changes_total", "Polls that detected a change.");
        describe_counter!(
            "notify_errors_total",
            "Per-destination notification failures."
        );
        describe_gauge!("watch_last_tick_ts", "Unix ts of the most recent poll.");
    });
}

/// Install the Prometheus recorder and serve the exposition format on `addr`.
/// Must be called from within a tokio runtime.
pub fn install_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("prometheus: install exporter")?;
    ensure_described();
    tracing::info!(%addr, "metrics exporter listening");
    Ok(())
}
