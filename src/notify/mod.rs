// src/notify/mod.rs
pub mod discord;

use async_trait::async_trait;
use metrics::counter;
use std::fmt;

pub use discord::DiscordNotifier;

/// A named delivery target, e.g. a chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Destination(pub String);

impl Destination {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("no route configured for destination `{0}`")]
    UnknownDestination(Destination),

    #[error("delivery to `{destination}` failed: {reason}")]
    Transport {
        destination: Destination,
        reason: String,
    },

    #[error("delivery to `{destination}` rejected with HTTP {status}")]
    Status {
        destination: Destination,
        status: u16,
    },
}

impl NotifyError {
    pub fn destination(&self) -> &Destination {
        match self {
            NotifyError::UnknownDestination(d) => d,
            NotifyError::Transport { destination, .. } => destination,
            NotifyError::Status { destination, .. } => destination,
        }
    }
}

/// Anything that can deliver a text message to a destination.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, destination: &Destination, message: &str) -> Result<(), NotifyError>;
}

/// Outcome of one broadcast: every destination lands in exactly one list.
#[derive(Debug, Default)]
pub struct BroadcastReport {
    pub successes: Vec<Destination>,
    pub errors: Vec<NotifyError>,
}

impl BroadcastReport {
    pub fn attempts(&self) -> usize {
        self.successes.len() + self.errors.len()
    }

    pub fn all_delivered(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Deliver `message` to every destination. A failure is recorded and the
/// remaining destinations are still attempted.
pub async fn broadcast<N: Notifier + ?Sized>(
    notifier: &N,
    destinations: &[Destination],
    message: &str,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for dest in destinations {
        match notifier.notify(dest, message).await {
            Ok(()) => {
                tracing::info!(destination = %dest, "message sent");
                report.successes.push(dest.clone());
            }
            Err(e) => {
                tracing::warn!(destination = %dest, error = %e, "message delivery failed");
                counter!("notify_errors_total").increment(1);
                report.errors.push(e);
            }
        }
    }

    report
}

/// Fallback when no chat transport is configured: messages go to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, destination: &Destination, message: &str) -> Result<(), NotifyError> {
        tracing::info!(destination = %destination, "{message}");
        Ok(())
    }
}
