// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod bootstrap;
pub mod change_detector;
pub mod config;
pub mod fetch;
pub mod ladder;
pub mod metrics;
pub mod monitor;
pub mod notify;
pub mod scheduler;
pub mod snapshot;

// ---- Re-exports for stable public API ----
pub use crate::change_detector::{ChangeDetector, ExactMatch};
pub use crate::fetch::{FetchError, Fetcher, HttpFetcher};
pub use crate::ladder::{Ladder, LadderDetector, LadderRecord};
pub use crate::monitor::{LadderMonitor, Monitor, PageMonitor, Watch};
pub use crate::notify::{broadcast, BroadcastReport, Destination, Notifier, NotifyError};
pub use crate::scheduler::{Scheduler, TickOutcome, ZeroInterval};
pub use crate::snapshot::SnapshotStore;
