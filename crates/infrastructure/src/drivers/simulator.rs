use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use domain::DomainError;
use domain::driver::RegisterTransport;
use domain::reading::encode_registers;
use serde::{Deserialize, Serialize};

/// Shape of the simulated register values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub min_value: u16,
    #[serde(default = "default_max_value")]
    pub max_value: u16,
    #[serde(default = "default_period_secs")]
    pub period_secs: f64,
}

fn default_max_value() -> u16 {
    1000
}
fn default_period_secs() -> f64 {
    60.0
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            min_value: 0,
            max_value: default_max_value(),
            period_secs: default_period_secs(),
        }
    }
}

/// In-process stand-in for a Modbus device, for running the gateway without hardware.
///
/// Register `address + i` follows a sine wave phase-shifted by `i`.
pub struct SimulatedTransport {
    config: SimulatorConfig,
    start_time: Instant,
    connected: bool,
}

impl SimulatedTransport {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            connected: false,
        }
    }

    fn register_value(&self, elapsed_secs: f64, offset: u16) -> u16 {
        let min = f64::from(self.config.min_value.min(self.config.max_value));
        let max = f64::from(self.config.max_value.max(self.config.min_value));
        let midpoint = (min + max) / 2.0;
        let amplitude = (max - min) / 2.0;
        let period = if self.config.period_secs > 0.0 {
            self.config.period_secs
        } else {
            default_period_secs()
        };

        let phase = elapsed_secs / period * 2.0 * std::f64::consts::PI + f64::from(offset);
        (midpoint + amplitude * phase.sin()).round().clamp(min, max) as u16
    }
}

#[async_trait]
impl RegisterTransport for SimulatedTransport {
    async fn connect(&mut self) -> Result<(), DomainError> {
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), DomainError> {
        self.connected = false;
        Ok(())
    }

    async fn read_holding_registers(
        &mut self,
        address: u16,
        count: u16,
    ) -> Result<Bytes, DomainError> {
        if !self.connected {
            return Err(DomainError::Connection("Not connected".into()));
        }
        if u32::from(address) + u32::from(count) > u32::from(u16::MAX) + 1 {
            return Err(DomainError::Exception("IllegalDataAddress".into()));
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let words: Vec<u16> = (0..count)
            .map(|i| self.register_value(elapsed, i))
            .collect();
        Ok(encode_registers(&words))
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
