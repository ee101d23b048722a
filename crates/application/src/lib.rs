//! Application layer - Polling workflow and the shared snapshot

pub mod poller;
pub mod snapshot;

pub use poller::{Backoff, DevicePoller, PollScheduler, PollerSettings};
pub use snapshot::SnapshotStore;
