// src/ladder/client.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::fetch::{read_body, FetchError, Fetcher};

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormatting {
    pub format: String,
}

/// POST body understood by the competition API's ladder view.
#[derive(Debug, Clone, Serialize)]
pub struct LadderQuery {
    pub page_size: u32,
    pub airtable_response_formatting: ResponseFormatting,
    pub view: String,
    pub filter_by_formula: String,
    pub rows: u32,
    pub offset: String,
}

impl LadderQuery {
    pub fn division(filter_by_formula: impl Into<String>) -> Self {
        Self {
            page_size: 100,
            airtable_response_formatting: ResponseFormatting {
                format: "string".into(),
            },
            view: "Division Ranking".into(),
            filter_by_formula: filter_by_formula.into(),
            rows: 0,
            offset: String::new(),
        }
    }
}

/// Fetcher for the ladder endpoint. The API only answers POSTs carrying the
/// view query and the page id header; one attempt per call.
#[derive(Clone)]
pub struct LadderClient {
    client: Client,
    page_id: String,
    query: LadderQuery,
}

impl LadderClient {
    pub fn new(timeout: Duration, page_id: impl Into<String>, query: LadderQuery) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            client,
            page_id: page_id.into(),
            query,
        })
    }

    pub fn query(&self) -> &LadderQuery {
        &self.query
    }
}

#[async_trait]
impl Fetcher for LadderClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .post(url)
            .header("accept", "application/json, text/plain, */*")
            .header("softr-page-id", &self.page_id)
            .json(&self.query)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        read_body(url, resp).await
    }
}
