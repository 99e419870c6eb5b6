// src/monitor.rs
//! Binds a fetcher, a decoder and a snapshot store into one watched source.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::change_detector::{ChangeDetector, ExactMatch};
use crate::fetch::{FetchError, Fetcher};
use crate::ladder::{Ladder, LadderDetector};
use crate::snapshot::SnapshotStore;

/// A snapshot type: how a fetched body is decoded and how a change is announced.
pub trait Payload: Clone + Send + Sync + 'static {
    fn decode(body: String) -> anyhow::Result<Self>;
    fn summary(&self, label: &str) -> String;
}

impl Payload for String {
    fn decode(body: String) -> anyhow::Result<Self> {
        Ok(body)
    }

    fn summary(&self, label: &str) -> String {
        format!(
            "Page changed: {label} (detected {})",
            Utc::now().format("%Y-%m-%d %H:%M UTC")
        )
    }
}

impl Payload for Ladder {
    fn decode(body: String) -> anyhow::Result<Self> {
        Ok(Ladder::from_json(&body)?)
    }

    fn summary(&self, label: &str) -> String {
        self.render(label)
    }
}

/// Result of one successful check.
#[derive(Debug, Clone)]
pub struct ChangeEvent<T> {
    pub changed: bool,
    pub snapshot: T,
}

pub struct Monitor<T, D = ExactMatch> {
    label: String,
    url: String,
    fetcher: Arc<dyn Fetcher>,
    store: SnapshotStore<T, D>,
}

pub type PageMonitor = Monitor<String, ExactMatch>;
pub type LadderMonitor = Monitor<Ladder, LadderDetector>;

impl<T> Monitor<T, ExactMatch> {
    pub fn new(url: impl Into<String>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_store(url, fetcher, SnapshotStore::new())
    }
}

impl<T, D> Monitor<T, D> {
    pub fn with_store(
        url: impl Into<String>,
        fetcher: Arc<dyn Fetcher>,
        store: SnapshotStore<T, D>,
    ) -> Self {
        let url = url.into();
        Self {
            label: url.clone(),
            url,
            fetcher,
            store,
        }
    }

    /// Human-facing name used in change messages; defaults to the url.
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn store(&self) -> &SnapshotStore<T, D> {
        &self.store
    }
}

impl<T: Payload, D: ChangeDetector<T>> Monitor<T, D> {
    /// Fetch, decode, then compare-and-update. A failed fetch or decode leaves
    /// the store untouched.
    pub async fn check(&self) -> Result<ChangeEvent<T>, FetchError> {
        let body = self.fetcher.fetch(&self.url).await?;
        let snapshot = T::decode(body).map_err(|e| FetchError::Read {
            url: self.url.clone(),
            reason: format!("{e:#}"),
        })?;

        let changed = self.store.compare_and_update(snapshot.clone());
        Ok(ChangeEvent { changed, snapshot })
    }
}

/// Object-safe view of a monitor, as driven by the scheduler.
#[async_trait]
pub trait Watch: Send + Sync {
    fn label(&self) -> &str;
    fn url(&self) -> &str;

    /// `Ok(Some(message))` exactly when the source changed since the last poll.
    async fn poll(&self) -> Result<Option<String>, FetchError>;
}

#[async_trait]
impl<T: Payload, D: ChangeDetector<T> + 'static> Watch for Monitor<T, D> {
    fn label(&self) -> &str {
        &self.label
    }

    fn url(&self) -> &str {
        &self.url
    }

    async fn poll(&self) -> Result<Option<String>, FetchError> {
        let ev = self.check().await?;
        Ok(ev.changed.then(|| ev.snapshot.summary(&self.label)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    struct Scripted(Mutex<VecDeque<Result<String, FetchError>>>);

    impl Scripted {
        fn new(steps: Vec<Result<String, FetchError>>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(steps.into())))
        }
    }

    #[async_trait]
    impl Fetcher for Scripted {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.0.lock().pop_front().unwrap_or_else(|| {
                Err(FetchError::Read {
                    url: url.to_string(),
                    reason: "script exhausted".into(),
                })
            })
        }
    }

    fn status_err() -> FetchError {
        FetchError::Status {
            url: "http://x".into(),
            status: reqwest::StatusCode::NOT_FOUND,
        }
    }

    #[tokio::test]
    async fn failed_fetch_does_not_touch_store() {
        let m = PageMonitor::new(
            "http://x",
            Scripted::new(vec![Ok("v1".into()), Err(status_err()), Ok("v1".into())]),
        );

        assert!(!m.check().await.unwrap().changed);
        assert!(m.check().await.is_err());
        assert_eq!(m.store().current().as_deref(), Some("v1"));
        assert!(!m.check().await.unwrap().changed);
    }

    #[tokio::test]
    async fn poll_yields_message_only_on_change() {
        let m = PageMonitor::new(
            "http://x",
            Scripted::new(vec![Ok("v1".into()), Ok("v1".into()), Ok("v2".into())]),
        )
        .labelled("Metro League");

        assert_eq!(m.poll().await.unwrap(), None);
        assert_eq!(m.poll().await.unwrap(), None);
        let msg = m.poll().await.unwrap().expect("changed");
        assert!(msg.starts_with("Page changed: Metro League"));
    }

    #[tokio::test]
    async fn undecodable_ladder_is_a_read_error() {
        let m = LadderMonitor::with_store(
            "http://x",
            Scripted::new(vec![Ok("<html>maintenance</html>".into())]),
            SnapshotStore::with_detector(LadderDetector::new()),
        );

        let err = m.check().await.unwrap_err();
        assert_eq!(err.kind(), "read");
        assert!(!m.store().is_seeded());
    }

    #[tokio::test]
    async fn ladder_monitor_reports_rank_swap() {
        let before = r#"{"records":[
            {"id":"1","fields":{"TeamNameLookup":"Aces","TeamName":"Aces","Rank":"1","Competition Points":"10"}},
            {"id":"2","fields":{"TeamNameLookup":"APG","TeamName":"APG","Rank":"2","Competition Points":"9"}}]}"#;
        let noise = r#"{"records":[
            {"id":"1","fields":{"TeamNameLookup":"Aces","TeamName":"Aces","Rank":"1","Competition Points":"10","TotalSetsA":"7"}},
            {"id":"2","fields":{"TeamNameLookup":"APG","TeamName":"APG","Rank":"2","Competition Points":"9"}}]}"#;
        let swapped = r#"{"records":[
            {"id":"1","fields":{"TeamNameLookup":"APG","TeamName":"APG","Rank":"1","Competition Points":"9"}},
            {"id":"2","fields":{"TeamNameLookup":"Aces","TeamName":"Aces","Rank":"2","Competition Points":"10"}}]}"#;

        let m = LadderMonitor::with_store(
            "http://x",
            Scripted::new(vec![
                Ok(before.into()),
                Ok(noise.into()),
                Ok(swapped.into()),
            ]),
            SnapshotStore::with_detector(LadderDetector::new()),
        )
        .labelled("https://example.org/ladder-m1");

        assert_eq!(m.poll().await.unwrap(), None);
        assert_eq!(m.poll().await.unwrap(), None);
        let msg = m.poll().await.unwrap().expect("rank swap");
        assert!(msg.contains("1. APG"));
        assert!(msg.contains("2. Aces"));
    }
}
