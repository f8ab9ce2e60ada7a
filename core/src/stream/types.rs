use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ConnectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionPhase {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Reconnecting => "RECONNECTING",
        }
    }

    /// Whether `self -> to` is an edge of the connection state machine.
    ///
    /// ```text
    /// DISCONNECTED -> CONNECTING -> CONNECTED -> RECONNECTING -> CONNECTING
    ///                 CONNECTING -> RECONNECTING
    /// any -> DISCONNECTED (explicit stop)
    /// ```
    pub fn can_transition_to(self, to: ConnectionPhase) -> bool {
        use ConnectionPhase::*;
        matches!(
            (self, to),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Reconnecting)
                | (Connected, Reconnecting)
                | (Reconnecting, Connecting)
                | (_, Disconnected)
        )
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection state owned by the stream source and published read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionState {
    pub phase: ConnectionPhase,
    /// Connect attempts since the last successful open.
    pub attempt: u32,
    pub last_error: Option<String>,
    pub since: DateTime<Utc>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            phase: ConnectionPhase::Disconnected,
            attempt: 0,
            last_error: None,
            since: Utc::now(),
        }
    }
}

impl ConnectionState {
    pub fn transition(&mut self, to: ConnectionPhase) -> Result<(), ConnectionError> {
        if !self.phase.can_transition_to(to) {
            return Err(ConnectionError {
                from: self.phase,
                to,
            });
        }
        match to {
            ConnectionPhase::Connecting => self.attempt += 1,
            ConnectionPhase::Connected => {
                self.attempt = 0;
                self.last_error = None;
            }
            _ => {}
        }
        self.phase = to;
        self.since = Utc::now();
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.phase == ConnectionPhase::Connected
    }
}

/// Exponential reconnect delay: starts at `initial`, doubles, capped at `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.min(max);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Delay to wait now; the following call returns the doubled value.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current + self.current).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(10))
    }
}
