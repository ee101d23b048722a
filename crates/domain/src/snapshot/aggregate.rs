use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::policy::FailurePolicy;
use super::status::{DeviceStatus, FailureRecord};
use crate::device::DeviceId;
use crate::driver::ConnectionState;
use crate::error::DomainError;
use crate::reading::Reading;

/// Result of one device's slot in a poll cycle
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Reading(Reading),
    Failed(DomainError),
    /// The device is waiting out a backoff delay; no I/O was attempted.
    Deferred,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    pub device_id: DeviceId,
    pub outcome: PollOutcome,
    pub connection: ConnectionState,
    pub consecutive_failures: u32,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSlot {
    pub id: DeviceId,
    pub reading: Option<Arc<Reading>>,
    pub status: DeviceStatus,
}

/// Latest known Reading and status per device, in configuration order.
///
/// Cloning is cheap: Readings are shared behind `Arc` and never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    cycle: u64,
    captured_at: Option<DateTime<Utc>>,
    devices: Vec<DeviceSlot>,
}

impl Snapshot {
    /// Empty snapshot with every device present and no Reading.
    pub fn new(ids: impl IntoIterator<Item = DeviceId>) -> Self {
        let devices = ids
            .into_iter()
            .map(|id| DeviceSlot {
                id,
                reading: None,
                status: DeviceStatus::default(),
            })
            .collect();

        Self {
            cycle: 0,
            captured_at: None,
            devices,
        }
    }

    /// Number of committed cycles.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }

    pub fn devices(&self) -> &[DeviceSlot] {
        &self.devices
    }

    pub fn device(&self, id: &DeviceId) -> Option<&DeviceSlot> {
        self.devices.iter().find(|slot| &slot.id == id)
    }

    pub fn reading(&self, id: &DeviceId) -> Option<Arc<Reading>> {
        self.device(id).and_then(|slot| slot.reading.clone())
    }

    /// Every device's Reading, or `None` if any device has none.
    pub fn complete_readings(&self) -> Option<Vec<(DeviceId, Arc<Reading>)>> {
        self.devices
            .iter()
            .map(|slot| slot.reading.clone().map(|r| (slot.id.clone(), r)))
            .collect()
    }

    /// Commit one cycle's reports. Reports for unknown devices are ignored.
    pub fn apply(&mut self, reports: Vec<PollReport>, policy: FailurePolicy, at: DateTime<Utc>) {
        for report in reports {
            let Some(slot) = self.devices.iter_mut().find(|s| s.id == report.device_id) else {
                continue;
            };

            slot.status.connection = report.connection;
            slot.status.consecutive_failures = report.consecutive_failures;

            match report.outcome {
                PollOutcome::Reading(reading) => {
                    slot.reading = Some(Arc::new(reading));
                    slot.status.last_success = Some(report.at);
                }
                PollOutcome::Failed(error) => {
                    slot.status.last_failure = Some(FailureRecord {
                        kind: error.failure_kind(),
                        message: error.to_string(),
                        at: report.at,
                    });
                    if policy == FailurePolicy::Clear {
                        slot.reading = None;
                    }
                }
                PollOutcome::Deferred => {}
            }
        }

        self.cycle += 1;
        self.captured_at = Some(at);
    }
}
