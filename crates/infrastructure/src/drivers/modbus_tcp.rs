use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use domain::DomainError;
use domain::device::DeviceEndpoint;
use domain::driver::RegisterTransport;
use domain::reading::encode_registers;
use tokio_modbus::client::Context;
use tokio_modbus::prelude::*;
use tracing::{debug, trace};

/// Deadlines applied to every network call a transport makes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportTimeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Default for TransportTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            read: Duration::from_secs(10),
        }
    }
}

/// Modbus TCP session with a single device
pub struct ModbusTcpTransport {
    endpoint: DeviceEndpoint,
    timeouts: TransportTimeouts,
    context: Option<Context>,
}

impl ModbusTcpTransport {
    pub fn new(endpoint: DeviceEndpoint, timeouts: TransportTimeouts) -> Self {
        Self {
            endpoint,
            timeouts,
            context: None,
        }
    }

    /// Resolve `authority` and open a session. Takes no `&self`: the context is not `Sync`.
    async fn open(authority: String, unit_id: u8) -> Result<Context, DomainError> {
        let addr = tokio::net::lookup_host(&authority)
            .await
            .map_err(|e| DomainError::Connection(format!("Cannot resolve {}: {}", authority, e)))?
            .next()
            .ok_or_else(|| DomainError::Connection(format!("No address for {}", authority)))?;

        tcp::connect_slave(addr, Slave(unit_id))
            .await
            .map_err(|e| DomainError::Connection(format!("Failed to connect to {}: {}", addr, e)))
    }
}

#[async_trait]
impl RegisterTransport for ModbusTcpTransport {
    async fn connect(&mut self) -> Result<(), DomainError> {
        self.context = None;

        let authority = self.endpoint.authority();
        let connect_timeout = self.timeouts.connect;
        let open = Self::open(authority.clone(), self.endpoint.unit_id);

        match tokio::time::timeout(connect_timeout, open).await {
            Ok(Ok(ctx)) => {
                debug!(
                    device_id = %self.endpoint.id,
                    addr = %authority,
                    unit_id = self.endpoint.unit_id,
                    "Modbus TCP session established"
                );
                self.context = Some(ctx);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DomainError::Connection(format!(
                "Connecting to {} timed out after {}ms",
                authority,
                connect_timeout.as_millis()
            ))),
        }
    }

    async fn disconnect(&mut self) -> Result<(), DomainError> {
        // Dropping the context closes the socket.
        self.context = None;
        Ok(())
    }

    async fn read_holding_registers(
        &mut self,
        address: u16,
        count: u16,
    ) -> Result<Bytes, DomainError> {
        let read_timeout = self.timeouts.read;
        let ctx = self
            .context
            .as_mut()
            .ok_or(DomainError::Connection("Not connected".into()))?;

        trace!(
            device_id = %self.endpoint.id,
            address,
            count,
            "Reading holding registers"
        );

        match tokio::time::timeout(read_timeout, ctx.read_holding_registers(address, count)).await
        {
            Ok(Ok(Ok(words))) => Ok(encode_registers(&words)),
            Ok(Ok(Err(exception))) => Err(DomainError::Exception(format!("{:?}", exception))),
            Ok(Err(e)) => Err(DomainError::Read(format!("Modbus transport error: {}", e))),
            Err(_) => Err(DomainError::Timeout(read_timeout.as_millis() as u64)),
        }
    }

    fn is_connected(&self) -> bool {
        self.context.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::DeviceId;

    fn endpoint(port: u16) -> DeviceEndpoint {
        DeviceEndpoint::new(DeviceId::new("plc-01").unwrap(), "127.0.0.1", port, 0, 2)
    }

    #[test]
    fn test_new_transport_is_disconnected() {
        let transport = ModbusTcpTransport::new(endpoint(502), TransportTimeouts::default());
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_read_without_connection_fails() {
        let mut transport = ModbusTcpTransport::new(endpoint(502), TransportTimeouts::default());
        let err = transport.read_holding_registers(0, 2).await.unwrap_err();
        assert!(matches!(err, DomainError::Connection(_)));
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        // Bind then drop to obtain a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut transport = ModbusTcpTransport::new(endpoint(port), TransportTimeouts::default());
        let err = transport.connect().await.unwrap_err();

        assert!(matches!(err, DomainError::Connection(_)));
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let mut transport = ModbusTcpTransport::new(endpoint(502), TransportTimeouts::default());
        transport.disconnect().await.unwrap();
        transport.disconnect().await.unwrap();
        assert!(!transport.is_connected());
    }
}
