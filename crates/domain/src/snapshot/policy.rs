use serde::{Deserialize, Serialize};

/// What a failed poll does to the device's published Reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Keep the last good Reading (stale but available)
    Retain,
    /// Replace the Reading with absent
    Clear,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::Retain
    }
}
