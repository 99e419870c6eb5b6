// src/config/watch.rs
use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use crate::notify::Destination;

pub const ENV_CONFIG_PATH: &str = "WATCH_CONFIG_PATH";
pub const ENV_DISCORD_WEBHOOK: &str = "DISCORD_WEBHOOK_URL";

pub const DEFAULT_CHANNEL: &str = "metro-volleyball-notifications";
pub const DEFAULT_PAGE_URL: &str = "https://www.vq.org.au/competitions/metro-league/";

// Current season's ladder endpoint (changes between seasons).
const DEFAULT_LADDER_API: &str = "https://vqmetro24s1.softr.app/v1/integrations/airtable/dc83c433-262d-48a0-915f-2cf124cceeb8/app4eDFcW0KK8A7xt";
const DEFAULT_LADDER_PATH: &str = "/Ladder/records?block_id=4cf2b9cc-8241-4332-9df5-47a68e375c5a";
const DEFAULT_LADDER_PAGE_ID: &str = "a7233511-bb1c-4840-9f02-d3198caf05f4";
const DEFAULT_LADDER_FILTER: &str = r#"(LOWER("MD") = LOWER(ARRAYJOIN({Division})))"#;
const DEFAULT_LADDER_LINK: &str = "https://vqmetro24s1.softr.app/ladder-m1";

fn default_interval() -> Duration {
    Duration::from_secs(60 * 60)
}
fn default_http_timeout() -> Duration {
    crate::fetch::DEFAULT_TIMEOUT
}
fn default_destinations() -> Vec<Destination> {
    vec![Destination::new(DEFAULT_CHANNEL)]
}
fn default_pages() -> Vec<PageWatchConfig> {
    vec![PageWatchConfig {
        url: DEFAULT_PAGE_URL.to_string(),
        label: None,
    }]
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Poll interval, e.g. "1h", "30m", "1h30m".
    #[serde(default = "default_interval", deserialize_with = "de_duration")]
    pub interval: Duration,
    #[serde(default = "default_http_timeout", deserialize_with = "de_duration")]
    pub http_timeout: Duration,
    #[serde(default = "default_destinations")]
    pub destinations: Vec<Destination>,
    /// Post a one-off "ready" message at startup.
    #[serde(default)]
    pub announce_ready: bool,
    /// Serve Prometheus metrics on this address when set.
    #[serde(default)]
    pub metrics_addr: Option<SocketAddr>,
    #[serde(default = "default_pages")]
    pub pages: Vec<PageWatchConfig>,
    #[serde(default)]
    pub ladder: Option<LadderWatchConfig>,
    #[serde(default)]
    pub discord: DiscordConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageWatchConfig {
    pub url: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LadderWatchConfig {
    pub api_url: String,
    pub path: String,
    pub page_id: String,
    pub filter_by_formula: String,
    /// Public ladder page linked from change messages.
    pub link: String,
    pub compare_team_name: bool,
}

impl Default for LadderWatchConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_LADDER_API.to_string(),
            path: DEFAULT_LADDER_PATH.to_string(),
            page_id: DEFAULT_LADDER_PAGE_ID.to_string(),
            filter_by_formula: DEFAULT_LADDER_FILTER.to_string(),
            link: DEFAULT_LADDER_LINK.to_string(),
            compare_team_name: false,
        }
    }
}

impl LadderWatchConfig {
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), self.path)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscordConfig {
    /// destination name -> webhook url ("ENV" reads DISCORD_WEBHOOK_URL)
    #[serde(default)]
    pub webhooks: HashMap<String, String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            http_timeout: default_http_timeout(),
            destinations: default_destinations(),
            announce_ready: false,
            metrics_addr: None,
            pages: default_pages(),
            ladder: None,
            discord: DiscordConfig::default(),
        }
    }
}

impl WatchConfig {
    /// Load from an explicit path. TOML or JSON, by extension.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading watch config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let mut cfg = parse_config(&content, &ext)
            .with_context(|| format!("parsing watch config {}", path.display()))?;
        cfg.resolve_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $WATCH_CONFIG_PATH
    /// 2) config/watch.toml
    /// 3) config/watch.json
    /// 4) built-in defaults (Metro League page only)
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
            }
            return Self::load_from(&pb);
        }
        for candidate in ["config/watch.toml", "config/watch.json"] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        let mut cfg = Self::default();
        cfg.resolve_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn resolve_env(&mut self) -> Result<()> {
        for (dest, url) in self.discord.webhooks.iter_mut() {
            if url.trim().eq_ignore_ascii_case("env") {
                *url = env::var(ENV_DISCORD_WEBHOOK)
                    .map_err(|_| anyhow!("webhook for `{dest}` is ENV but {ENV_DISCORD_WEBHOOK} is unset"))?;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            bail!("interval must be greater than zero");
        }
        if self.http_timeout.is_zero() {
            bail!("http_timeout must be greater than zero");
        }
        if self.destinations.is_empty() {
            bail!("at least one destination is required");
        }
        if self.pages.is_empty() && self.ladder.is_none() {
            bail!("nothing to watch: configure `pages` or `ladder`");
        }
        if let Some(p) = self.pages.iter().find(|p| p.url.trim().is_empty()) {
            bail!("page watch with empty url (label: {:?})", p.label);
        }
        if let Some(l) = &self.ladder {
            if l.api_url.trim().is_empty() {
                bail!("ladder.api_url must not be empty");
            }
        }
        Ok(())
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<WatchConfig> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        _ => {
            let trimmed = s.trim_start();
            if trimmed.starts_with('{') {
                Ok(serde_json::from_str(s)?)
            } else {
                Ok(toml::from_str(s)?)
            }
        }
    }
}

fn de_duration<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Duration, D::Error> {
    let s = String::deserialize(d)?;
    parse_duration(&s).map_err(serde::de::Error::custom)
}

/// Parse "1h", "30m", "90s", "500ms", "2d" and combinations such as "1h30m".
pub fn parse_duration(s: &str) -> Result<Duration> {
    static RE_PART: OnceCell<Regex> = OnceCell::new();
    let re = RE_PART.get_or_init(|| Regex::new(r"(\d+)\s*(ms|s|m|h|d)").unwrap());

    let compact: String = s.split_whitespace().collect();
    if compact.is_empty() {
        bail!("empty duration");
    }

    let mut total = Duration::ZERO;
    let mut consumed = 0;
    for cap in re.captures_iter(&compact) {
        let whole = cap.get(0).map(|m| m.range()).unwrap_or_default();
        if whole.start != consumed {
            bail!("invalid duration `{s}`");
        }
        consumed = whole.end;

        let n: u64 = cap[1]
            .parse()
            .with_context(|| format!("duration value out of range in `{s}`"))?;
        let part = match &cap[2] {
            "ms" => Duration::from_millis(n),
            "s" => Duration::from_secs(n),
            "m" => Duration::from_secs(n.saturating_mul(60)),
            "h" => Duration::from_secs(n.saturating_mul(3_600)),
            "d" => Duration::from_secs(n.saturating_mul(86_400)),
            _ => unreachable!(),
        };
        total = total.saturating_add(part);
    }

    if consumed != compact.len() {
        bail!("invalid duration `{s}` (expected e.g. 1h, 30m, 90s)");
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_parse() {
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1800));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1h 30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("2d").unwrap(), Duration::from_secs(172_800));
        assert_eq!(parse_duration("0s").unwrap(), Duration::ZERO);
    }

    #[test]
    fn bad_durations_are_rejected() {
        for bad in ["", "1", "h", "1x", "1h-", "abc1h", "1.5h"] {
            assert!(parse_duration(bad).is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn toml_config_with_defaults() {
        let cfg = parse_config(
            r#"
interval = "15m"

[[pages]]
url = "https://example.org/draw"
label = "Draw"
"#,
            "toml",
        )
        .unwrap();

        assert_eq!(cfg.interval, Duration::from_secs(900));
        assert_eq!(cfg.http_timeout, Duration::from_secs(10));
        assert_eq!(cfg.destinations, vec![Destination::new(DEFAULT_CHANNEL)]);
        assert_eq!(cfg.pages.len(), 1);
        assert_eq!(cfg.pages[0].label.as_deref(), Some("Draw"));
        assert!(cfg.ladder.is_none());
        cfg.validate().unwrap();
    }

    #[test]
    fn ladder_section_fills_in_season_defaults() {
        let cfg = parse_config(
            r#"{"pages": [], "ladder": {"compare_team_name": true}}"#,
            "",
        )
        .unwrap();
        let ladder = cfg.ladder.as_ref().unwrap();
        assert!(ladder.compare_team_name);
        assert_eq!(ladder.page_id, DEFAULT_LADDER_PAGE_ID);
        assert!(ladder.endpoint().ends_with(DEFAULT_LADDER_PATH));
        cfg.validate().unwrap();
    }

    #[test]
    fn zero_interval_and_empty_watch_list_are_invalid() {
        let zero = parse_config(r#"interval = "0s""#, "toml").unwrap();
        assert!(zero.validate().is_err());

        let nothing = parse_config(r#"pages = []"#, "toml").unwrap();
        assert!(nothing.validate().is_err());

        let no_dest = parse_config(r#"destinations = []"#, "toml").unwrap();
        assert!(no_dest.validate().is_err());
    }
}
