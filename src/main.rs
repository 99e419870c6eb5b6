//! metro-watch: binary entrypoint.
//! Loads config, starts one poll loop per watched source, and stops them on Ctrl-C / SIGTERM.

use anyhow::Context;
use metro_watch::bootstrap::WatchRuntime;
use metro_watch::config::WatchConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("metro_watch=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("ctrl-c handler: {e:#}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler: {e:#}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = WatchConfig::load_default().context("loading watch config")?;
    if let Some(addr) = cfg.metrics_addr {
        metro_watch::metrics::install_exporter(addr)?;
    }

    let runtime = WatchRuntime::from_config(cfg)?;
    runtime.announce_ready().await;

    let cancel = CancellationToken::new();
    let handles = runtime.spawn_all(&cancel);
    tracing::info!("metro-watch is running. Press CTRL-C to exit.");

    shutdown_signal().await;
    tracing::info!("shutdown requested");
    cancel.cancel();

    for h in handles {
        if let Err(e) = h.await {
            tracing::warn!("monitor task ended abnormally: {e}");
        }
    }
    Ok(())
}
