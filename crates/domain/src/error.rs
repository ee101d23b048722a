use thiserror::Error;

use crate::snapshot::FailureKind;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid device ID: {0}")]
    InvalidDeviceId(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Read error: {0}")]
    Read(String),

    #[error("Modbus exception: {0}")]
    Exception(String),

    #[error("Timed out after {0}ms")]
    Timeout(u64),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl DomainError {
    /// Classify a per-cycle failure for the device status.
    ///
    /// Configuration and lookup errors never occur inside a poll cycle; they
    /// are reported as read failures if they ever reach the status.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Connection(_) => FailureKind::Connection,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::MalformedPayload(_) => FailureKind::MalformedPayload,
            Self::Read(_)
            | Self::Exception(_)
            | Self::InvalidConfiguration(_)
            | Self::InvalidDeviceId(_)
            | Self::DeviceNotFound(_) => FailureKind::Read,
        }
    }

    /// Whether the transport must be dropped and re-established after this error.
    pub fn requires_reconnect(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Timeout(_) | Self::Read(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
