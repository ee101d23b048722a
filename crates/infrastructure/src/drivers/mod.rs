mod modbus_tcp;
mod simulator;

pub use modbus_tcp::{ModbusTcpTransport, TransportTimeouts};
pub use simulator::{SimulatedTransport, SimulatorConfig};

use domain::DomainError;
use domain::device::DeviceEndpoint;
use domain::driver::{RegisterTransport, TransportFactory};

/// Creates a Modbus TCP transport per endpoint
#[derive(Debug, Clone, Default)]
pub struct ModbusTransportFactory {
    timeouts: TransportTimeouts,
}

impl ModbusTransportFactory {
    pub fn new(timeouts: TransportTimeouts) -> Self {
        Self { timeouts }
    }
}

impl TransportFactory for ModbusTransportFactory {
    fn create(&self, endpoint: &DeviceEndpoint) -> Result<Box<dyn RegisterTransport>, DomainError> {
        endpoint.validate()?;
        Ok(Box::new(ModbusTcpTransport::new(endpoint.clone(), self.timeouts))
            as Box<dyn RegisterTransport>)
    }
}

/// Creates simulated transports, ignoring host and port
#[derive(Debug, Clone, Default)]
pub struct SimulatorTransportFactory {
    config: SimulatorConfig,
}

impl SimulatorTransportFactory {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }
}

impl TransportFactory for SimulatorTransportFactory {
    fn create(&self, endpoint: &DeviceEndpoint) -> Result<Box<dyn RegisterTransport>, DomainError> {
        endpoint.validate()?;
        Ok(Box::new(SimulatedTransport::new(self.config.clone())) as Box<dyn RegisterTransport>)
    }
}
