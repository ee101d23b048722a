//! Infrastructure layer - Modbus transports and configuration loading

pub mod config;
pub mod drivers;

pub use config::GatewayConfig;
pub use drivers::{ModbusTcpTransport, ModbusTransportFactory, SimulatorTransportFactory};
