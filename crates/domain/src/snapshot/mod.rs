mod aggregate;
mod policy;
mod status;

pub use aggregate::{DeviceSlot, PollOutcome, PollReport, Snapshot};
pub use policy::FailurePolicy;
pub use status::{DeviceStatus, FailureKind, FailureRecord};
