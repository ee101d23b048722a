mod device_id;
mod endpoint;

pub use device_id::DeviceId;
pub use endpoint::{DeviceEndpoint, MAX_READ_COUNT};
