//! Domain layer - Pure types for the register gateway, no I/O
//!
//! This crate contains:
//! - Device identity and endpoints
//! - Readings and the register payload codec
//! - The Snapshot aggregate and per-device status
//! - The transport trait infrastructure implements

pub mod device;
pub mod driver;
pub mod error;
pub mod reading;
pub mod snapshot;

// Re-export commonly used types
pub use device::{DeviceEndpoint, DeviceId};
pub use error::DomainError;
pub use reading::Reading;
pub use snapshot::{FailurePolicy, Snapshot};
