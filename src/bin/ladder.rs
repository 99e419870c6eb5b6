//! Fetch the current ladder once and print the message that would be posted.

use anyhow::Context;
use metro_watch::bootstrap::build_ladder_monitor;
use metro_watch::config::WatchConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let _ = dotenvy::dotenv();

    let cfg = WatchConfig::load_default().context("loading watch config")?;
    let ladder_cfg = cfg.ladder.clone().unwrap_or_default();
    let monitor = build_ladder_monitor(&cfg, &ladder_cfg)?;

    let ev = monitor.check().await.context("fetching ladder")?;
    println!("{}", ev.snapshot.render(&ladder_cfg.link));
    Ok(())
}
