// src/fetch.rs
//! One-shot HTTP retrieval of a monitored source.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("could not read body from {url}: {reason}")]
    Read { url: String, reason: String },

    #[error("http client setup failed: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "transport",
            FetchError::Status { .. } => "status",
            FetchError::Read { .. } => "read",
            FetchError::Client(_) => "client",
        }
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Plain GET fetcher. Single attempt, bounded by the client timeout.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        read_body(url, resp).await
    }
}

/// Validate the status and read the whole body. Shared by every fetcher.
///
/// The body must be valid UTF-8; it is never decoded lossily, so two bodies
/// that differ in any byte never compare equal.
pub(crate) async fn read_body(url: &str, resp: Response) -> Result<String, FetchError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let content_length = resp.content_length();
    let bytes = resp.bytes().await.map_err(|e| FetchError::Read {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let body = String::from_utf8(bytes.to_vec()).map_err(|e| FetchError::Read {
        url: url.to_string(),
        reason: format!("body is not valid utf-8: {e}"),
    })?;

    tracing::info!(
        url,
        status = status.as_u16(),
        content_length = content_length.unwrap_or(body.len() as u64),
        "source response"
    );
    Ok(body)
}
