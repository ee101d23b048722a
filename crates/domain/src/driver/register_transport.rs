use async_trait::async_trait;
use bytes::Bytes;

use crate::device::DeviceEndpoint;
use crate::error::DomainError;

/// Session with one Modbus device that infrastructure implementations must provide
#[async_trait]
pub trait RegisterTransport: Send {
    /// Establish the session. Implementations bound the attempt with their connect timeout.
    async fn connect(&mut self) -> Result<(), DomainError>;

    /// Drop the session. Idempotent.
    async fn disconnect(&mut self) -> Result<(), DomainError>;

    /// Issue "read holding registers" and return the raw register payload,
    /// two big-endian bytes per register.
    async fn read_holding_registers(&mut self, address: u16, count: u16)
    -> Result<Bytes, DomainError>;

    fn is_connected(&self) -> bool;
}

/// Builds a fresh transport for an endpoint
pub trait TransportFactory: Send + Sync {
    fn create(&self, endpoint: &DeviceEndpoint) -> Result<Box<dyn RegisterTransport>, DomainError>;
}
