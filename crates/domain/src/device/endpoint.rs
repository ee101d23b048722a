use serde::{Deserialize, Serialize};

use super::DeviceId;
use crate::error::{DomainError, Result};

/// Largest register count a single "read holding registers" request may ask for.
pub const MAX_READ_COUNT: u16 = 125;

fn default_unit_id() -> u8 {
    1
}

/// A Modbus TCP device and the register block polled from it.
///
/// Immutable after startup. `start_address` is the address as written in the
/// configuration; when `one_based` is set the wire request uses `start_address - 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEndpoint {
    pub id: DeviceId,
    pub host: String,
    pub port: u16,
    pub start_address: u16,
    pub count: u16,
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,
    #[serde(default)]
    pub one_based: bool,
}

impl DeviceEndpoint {
    pub fn new(id: DeviceId, host: impl Into<String>, port: u16, start_address: u16, count: u16) -> Self {
        Self {
            id,
            host: host.into(),
            port,
            start_address,
            count,
            unit_id: default_unit_id(),
            one_based: false,
        }
    }

    pub fn with_unit_id(mut self, unit_id: u8) -> Self {
        self.unit_id = unit_id;
        self
    }

    pub fn with_one_based(mut self, one_based: bool) -> Self {
        self.one_based = one_based;
        self
    }

    /// `host:port` as handed to the resolver.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Address sent in the request PDU.
    pub fn wire_address(&self) -> Result<u16> {
        if !self.one_based {
            return Ok(self.start_address);
        }
        self.start_address.checked_sub(1).ok_or_else(|| {
            DomainError::InvalidConfiguration(format!(
                "Device {}: start address 0 is invalid with one-based addressing",
                self.id
            ))
        })
    }

    /// Check every invariant a poll request relies on.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(format!(
                "Device {}: host cannot be empty",
                self.id
            )));
        }
        if self.port == 0 {
            return Err(DomainError::InvalidConfiguration(format!(
                "Device {}: port cannot be 0",
                self.id
            )));
        }
        if self.count == 0 || self.count > MAX_READ_COUNT {
            return Err(DomainError::InvalidConfiguration(format!(
                "Device {}: register count {} out of range 1..={}",
                self.id, self.count, MAX_READ_COUNT
            )));
        }

        let address = self.wire_address()?;
        if u32::from(address) + u32::from(self.count) > u32::from(u16::MAX) + 1 {
            return Err(DomainError::InvalidConfiguration(format!(
                "Device {}: registers {}..{} exceed the address space",
                self.id,
                address,
                u32::from(address) + u32::from(self.count)
            )));
        }

        Ok(())
    }
}
