pub mod watch;

pub use watch::{parse_duration, LadderWatchConfig, PageWatchConfig, WatchConfig};
