//! Poll transport configuration

use std::time::Duration;

/// Timing knobs for the poll transport
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Inactivity window after which a session record is purged entirely.
    /// A client that stops polling is reaped, never told to stop.
    pub session_ttl: Duration,

    /// How recently a waiting candidate must have been active to be
    /// eligible as a match partner. Much shorter than the TTL so a client
    /// that stopped polling is not paired with while it slowly expires.
    pub freshness_window: Duration,

    /// How often the background sweeper purges expired records
    pub sweep_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(120),
            freshness_window: Duration::from_secs(15),
            sweep_interval: Duration::from_secs(30),
        }
    }
}

impl PollConfig {
    /// Set the session TTL
    pub fn session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set the match freshness window
    pub fn freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// Set the sweeper interval
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}
