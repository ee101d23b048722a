use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::driver::ConnectionState;

/// Category of the last failed poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Connection,
    Read,
    Timeout,
    MalformedPayload,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Read => "read",
            Self::Timeout => "timeout",
            Self::MalformedPayload => "malformed_payload",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub kind: FailureKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Operational state of one device, as exposed by the structured API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub connection: ConnectionState,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<FailureRecord>,
    pub consecutive_failures: u32,
}

impl DeviceStatus {
    /// True when the newest recorded event is a failure.
    pub fn is_degraded(&self) -> bool {
        match (&self.last_failure, self.last_success) {
            (Some(failure), Some(success)) => failure.at > success,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}
