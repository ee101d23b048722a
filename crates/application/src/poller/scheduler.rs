use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use domain::DomainError;
use domain::device::DeviceEndpoint;
use domain::driver::TransportFactory;
use domain::snapshot::PollOutcome;

use super::{DevicePoller, PollerSettings};
use crate::snapshot::SnapshotStore;

/// The single background task that polls every device and commits each cycle.
pub struct PollScheduler {
    pollers: Vec<DevicePoller>,
    store: Arc<SnapshotStore>,
    interval: Duration,
}

impl PollScheduler {
    pub fn new(pollers: Vec<DevicePoller>, store: Arc<SnapshotStore>, interval: Duration) -> Self {
        Self {
            pollers,
            store,
            interval,
        }
    }

    /// Build one poller per endpoint with transports from `factory`.
    pub fn from_endpoints(
        endpoints: &[DeviceEndpoint],
        factory: &dyn TransportFactory,
        settings: PollerSettings,
        store: Arc<SnapshotStore>,
        interval: Duration,
    ) -> Result<Self, DomainError> {
        let pollers = endpoints
            .iter()
            .map(|endpoint| {
                let transport = factory.create(endpoint)?;
                DevicePoller::new(endpoint.clone(), transport, settings)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(pollers, store, interval))
    }

    /// Attempt every device concurrently, then publish all outcomes together.
    pub async fn run_cycle(&mut self) -> u64 {
        let reports = join_all(self.pollers.iter_mut().map(|p| p.poll_cycle())).await;

        for report in &reports {
            match &report.outcome {
                PollOutcome::Reading(reading) => debug!(
                    device_id = %report.device_id,
                    values = ?reading.values(),
                    "Poll succeeded"
                ),
                PollOutcome::Failed(e) => debug!(
                    device_id = %report.device_id,
                    kind = e.failure_kind().as_str(),
                    "Poll failed"
                ),
                PollOutcome::Deferred => {}
            }
        }

        self.store.commit(reports)
    }

    /// Poll on a fixed cadence until `cancel_token` fires, then drop all transports.
    pub async fn run(mut self, cancel_token: CancellationToken) {
        info!(
            devices = self.pollers.len(),
            interval_ms = self.interval.as_millis() as u64,
            "Starting poll loop"
        );

        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!("Shutdown signal received, stopping poll loop");
                    break;
                }
                _ = timer.tick() => {
                    self.run_cycle().await;
                }
            }
        }

        for poller in &mut self.pollers {
            poller.shutdown().await;
        }
    }
}
