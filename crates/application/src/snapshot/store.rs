use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use tokio::sync::watch;

use domain::device::DeviceId;
use domain::reading::Reading;
use domain::snapshot::{FailurePolicy, PollReport, Snapshot};

/// Process-wide holder of the latest Snapshot.
///
/// Single writer (the poll scheduler), any number of readers. Guards are only
/// held long enough to clone `Arc`s in or out; serialisation happens outside.
pub struct SnapshotStore {
    inner: RwLock<Snapshot>,
    policy: FailurePolicy,
    cycles: watch::Sender<u64>,
}

impl SnapshotStore {
    pub fn new(ids: impl IntoIterator<Item = DeviceId>, policy: FailurePolicy) -> Self {
        let (cycles, _) = watch::channel(0);
        Self {
            inner: RwLock::new(Snapshot::new(ids)),
            policy,
            cycles,
        }
    }

    /// Consistent copy of every device's Reading and status.
    pub fn snapshot(&self) -> Snapshot {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Readings of two devices taken in one critical section.
    pub fn get_pair(
        &self,
        first: &DeviceId,
        second: &DeviceId,
    ) -> (Option<Arc<Reading>>, Option<Arc<Reading>>) {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        (guard.reading(first), guard.reading(second))
    }

    pub fn reading(&self, id: &DeviceId) -> Option<Arc<Reading>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .reading(id)
    }

    /// Publish one cycle's reports atomically and return the new cycle number.
    pub fn commit(&self, reports: Vec<PollReport>) -> u64 {
        let now = Utc::now();
        let cycle = {
            let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            guard.apply(reports, self.policy, now);
            guard.cycle()
        };
        self.cycles.send_replace(cycle);
        cycle
    }

    /// Watch the committed cycle counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.cycles.subscribe()
    }
}
