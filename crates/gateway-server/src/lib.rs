pub mod api;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use application::{Backoff, PollerSettings, SnapshotStore};
use infrastructure::config::PollConfig;
use infrastructure::GatewayConfig;
use state::AppState;

/// Backoff and per-attempt deadline derived from the poll configuration.
pub fn poller_settings(poll: &PollConfig) -> PollerSettings {
    let backoff = Backoff::new(
        Duration::from_millis(poll.backoff.initial_ms),
        Duration::from_millis(poll.backoff.max_ms),
    )
    .with_max_attempts(poll.backoff.max_attempts);

    PollerSettings {
        backoff,
        deadline: poll.deadline(),
    }
}

pub fn setup_app_state(config: &GatewayConfig) -> Arc<AppState> {
    let store = Arc::new(SnapshotStore::new(
        config.devices.iter().map(|d| d.id.clone()),
        config.poll.failure_policy,
    ));
    Arc::new(AppState::new(store, config.devices.clone()))
}
