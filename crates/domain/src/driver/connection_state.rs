use serde::{Deserialize, Serialize};

/// Connection state of a device transport, as seen by the poller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No transport, no attempt made yet
    Disconnected,
    /// Connection attempt in flight
    Connecting,
    /// Transport established and answering reads
    Connected,
    /// Waiting out a backoff delay before the next attempt
    Reconnecting,
    /// Consecutive failures reached the configured limit; retries continue at the capped delay
    Failed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Failed => "failed",
        }
    }

    /// Transition to connecting state
    pub fn to_connecting(&self) -> Result<Self, &'static str> {
        match self {
            Self::Disconnected | Self::Reconnecting | Self::Failed => Ok(Self::Connecting),
            _ => Err("Can only connect from Disconnected, Reconnecting or Failed state"),
        }
    }

    /// Transition to connected state
    pub fn to_connected(&self) -> Result<Self, &'static str> {
        match self {
            Self::Connecting | Self::Connected => Ok(Self::Connected),
            _ => Err("Can only complete connection from Connecting state"),
        }
    }

    /// State after a failed attempt, given the consecutive failure count and optional limit.
    pub fn after_failure(&self, consecutive_failures: u32, max_attempts: Option<u32>) -> Self {
        match max_attempts {
            Some(max) if consecutive_failures >= max => Self::Failed,
            _ => Self::Reconnecting,
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::Disconnected
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
