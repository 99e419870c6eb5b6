use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Duration;

use super::{Destination, NotifyError, Notifier};

/// Discord rejects message content above this many characters.
pub const MAX_CONTENT_CHARS: usize = 2000;

const FENCE: &str = "```";

/// Posts messages through channel webhooks. Each destination maps to one
/// webhook URL; a destination without a webhook fails on its own.
#[derive(Clone)]
pub struct DiscordNotifier {
    webhooks: HashMap<String, String>,
    client: Client,
    timeout: Duration,
}

impl DiscordNotifier {
    pub fn new(webhooks: HashMap<String, String>) -> Self {
        Self {
            webhooks,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn routes(&self) -> usize {
        self.webhooks.len()
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, destination: &Destination, message: &str) -> Result<(), NotifyError> {
        let Some(webhook) = self.webhooks.get(destination.as_str()) else {
            return Err(NotifyError::UnknownDestination(destination.clone()));
        };

        let content = fit_content(message, MAX_CONTENT_CHARS);
        let payload = DiscordWebhookPayload { content: &content };

        let rsp = self
            .client
            .post(webhook)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Transport {
                destination: destination.clone(),
                reason: e.to_string(),
            })?;

        let status = rsp.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                destination: destination.clone(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct DiscordWebhookPayload<'a> {
    content: &'a str,
}

/// Cut `message` to at most `max` chars. A code block left open by the cut is
/// closed again so the rest of the channel does not render as code.
fn fit_content(message: &str, max: usize) -> Cow<'_, str> {
    let kept = truncate_chars(message, max);
    if kept.len() == message.len() || kept.matches(FENCE).count() % 2 == 0 {
        return Cow::Borrowed(kept);
    }
    let closing = format!("\n{FENCE}");
    let kept = truncate_chars(message, max.saturating_sub(closing.len()));
    if kept.matches(FENCE).count() % 2 == 1 {
        Cow::Owned(format!("{kept}{closing}"))
    } else {
        Cow::Borrowed(kept)
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
