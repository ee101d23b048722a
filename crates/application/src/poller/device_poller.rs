use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use domain::DomainError;
use domain::device::{DeviceEndpoint, DeviceId};
use domain::driver::{ConnectionState, RegisterTransport};
use domain::reading::Reading;
use domain::snapshot::{PollOutcome, PollReport};

use super::Backoff;

/// Per-device knobs shared by every poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    pub backoff: Backoff,
    /// Upper bound on one connect-and-read attempt
    pub deadline: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            backoff: Backoff::default(),
            deadline: Duration::from_secs(20),
        }
    }
}

/// Owns one device's transport and turns each poll slot into a [`PollReport`]
pub struct DevicePoller {
    endpoint: DeviceEndpoint,
    wire_address: u16,
    transport: Box<dyn RegisterTransport>,
    settings: PollerSettings,
    state: ConnectionState,
    consecutive_failures: u32,
    reconnect_attempts: u32,
    retry_at: Option<Instant>,
}

impl DevicePoller {
    pub fn new(
        endpoint: DeviceEndpoint,
        transport: Box<dyn RegisterTransport>,
        settings: PollerSettings,
    ) -> Result<Self, DomainError> {
        endpoint.validate()?;
        let wire_address = endpoint.wire_address()?;

        Ok(Self {
            endpoint,
            wire_address,
            transport,
            settings,
            state: ConnectionState::Disconnected,
            consecutive_failures: 0,
            reconnect_attempts: 0,
            retry_at: None,
        })
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.endpoint.id
    }

    /// Run this device's slot of a cycle. Never fails; failures are reported.
    pub async fn poll_cycle(&mut self) -> PollReport {
        if let Some(retry_at) = self.retry_at {
            if Instant::now() < retry_at {
                debug!(
                    device_id = %self.endpoint.id,
                    remaining_ms = (retry_at - Instant::now()).as_millis() as u64,
                    "Backing off, skipping poll"
                );
                return self.report(PollOutcome::Deferred);
            }
        }

        let deadline = self.settings.deadline;
        let outcome = match tokio::time::timeout(deadline, self.attempt()).await {
            Ok(Ok(reading)) => {
                self.record_success();
                PollOutcome::Reading(reading)
            }
            Ok(Err(e)) => {
                self.record_failure(&e).await;
                PollOutcome::Failed(e)
            }
            Err(_) => {
                let e = DomainError::Timeout(deadline.as_millis() as u64);
                self.record_failure(&e).await;
                PollOutcome::Failed(e)
            }
        };

        self.report(outcome)
    }

    /// Drop the transport. Used on shutdown.
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.transport.disconnect().await {
            warn!(device_id = %self.endpoint.id, error = %e, "Disconnect failed");
        }
        self.state = ConnectionState::Disconnected;
    }

    async fn attempt(&mut self) -> Result<Reading, DomainError> {
        if !self.transport.is_connected() {
            self.state = self.state.to_connecting().unwrap_or(ConnectionState::Connecting);
            info!(
                device_id = %self.endpoint.id,
                addr = %self.endpoint.authority(),
                attempt = self.reconnect_attempts + 1,
                "Connecting to device"
            );
            self.transport.connect().await?;
            self.state = self.state.to_connected().unwrap_or(ConnectionState::Connected);
            info!(device_id = %self.endpoint.id, "Connected");
        }

        let payload = self
            .transport
            .read_holding_registers(self.wire_address, self.endpoint.count)
            .await?;

        let reading = Reading::from_payload(&payload)?;
        if reading.values().len() != usize::from(self.endpoint.count) {
            return Err(DomainError::MalformedPayload(format!(
                "expected {} registers, got {}",
                self.endpoint.count,
                reading.values().len()
            )));
        }

        Ok(reading)
    }

    fn record_success(&mut self) {
        if self.consecutive_failures > 0 {
            info!(
                device_id = %self.endpoint.id,
                failures = self.consecutive_failures,
                "Device recovered"
            );
        }
        self.consecutive_failures = 0;
        self.reconnect_attempts = 0;
        self.retry_at = None;
        self.state = ConnectionState::Connected;
    }

    async fn record_failure(&mut self, error: &DomainError) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if !error.requires_reconnect() {
            // Device answered; the session is still usable.
            warn!(
                device_id = %self.endpoint.id,
                error = %error,
                "Poll failed, keeping connection"
            );
            return;
        }

        if let Err(e) = self.transport.disconnect().await {
            warn!(device_id = %self.endpoint.id, error = %e, "Disconnect failed");
        }

        self.reconnect_attempts = self.reconnect_attempts.saturating_add(1);

        let previous = self.state;
        self.state = previous.after_failure(
            self.reconnect_attempts,
            self.settings.backoff.max_attempts(),
        );

        let delay = if self.state == ConnectionState::Failed {
            self.settings.backoff.max_delay()
        } else {
            self.settings.backoff.delay(self.reconnect_attempts)
        };
        self.retry_at = Some(Instant::now() + delay);

        if self.state == ConnectionState::Failed && previous != ConnectionState::Failed {
            error!(
                device_id = %self.endpoint.id,
                attempts = self.reconnect_attempts,
                error = %error,
                "Device marked failed, retrying at capped backoff"
            );
        } else {
            warn!(
                device_id = %self.endpoint.id,
                attempt = self.reconnect_attempts,
                backoff_ms = delay.as_millis() as u64,
                error = %error,
                "Poll failed, reconnecting after backoff"
            );
        }
    }

    fn report(&self, outcome: PollOutcome) -> PollReport {
        PollReport {
            device_id: self.endpoint.id.clone(),
            outcome,
            connection: self.state,
            consecutive_failures: self.consecutive_failures,
            at: Utc::now(),
        }
    }
}
