mod backoff;
mod device_poller;
mod scheduler;

pub use backoff::Backoff;
pub use device_poller::{DevicePoller, PollerSettings};
pub use scheduler::PollScheduler;
