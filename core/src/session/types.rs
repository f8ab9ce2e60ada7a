use std::time::Duration;

use crate::poll::DEFAULT_POLL_INTERVAL;
use crate::stream::Backoff;

/// Tuning for one watch session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub poll_interval: Duration,
    /// When false only the poll source runs.
    pub stream_enabled: bool,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Capacity of the source → reconcile loop channel.
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            stream_enabled: true,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            channel_capacity: 256,
        }
    }
}

impl SessionConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.initial_backoff, self.max_backoff)
    }
}

/// Poll-side connectivity, for the header indicator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceHealth {
    pub poll_failures: u32,
    pub last_poll_error: Option<String>,
    /// Polling ended after a terminal snapshot.
    pub poll_stopped: bool,
    /// Source events discarded because they carried an old epoch.
    pub stale_events: u64,
}
