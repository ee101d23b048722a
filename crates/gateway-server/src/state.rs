use std::sync::Arc;

use application::SnapshotStore;
use domain::{DeviceEndpoint, DeviceId, DomainError};

/// Shared state handed to every HTTP handler
pub struct AppState {
    pub store: Arc<SnapshotStore>,
    /// Configured devices, in configuration order
    pub devices: Vec<DeviceEndpoint>,
}

impl AppState {
    pub fn new(store: Arc<SnapshotStore>, devices: Vec<DeviceEndpoint>) -> Self {
        Self { store, devices }
    }

    /// Look up a configured device by its raw id as it appears in a request path.
    pub fn endpoint(&self, id: &str) -> Result<&DeviceEndpoint, DomainError> {
        let not_found = || DomainError::DeviceNotFound(id.to_string());
        let id = DeviceId::new(id).map_err(|_| not_found())?;
        self.devices
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::snapshot::FailurePolicy;

    fn state() -> AppState {
        let id = DeviceId::new("modbus1").unwrap();
        let store = Arc::new(SnapshotStore::new([id.clone()], FailurePolicy::Retain));
        AppState::new(store, vec![DeviceEndpoint::new(id, "10.0.0.1", 502, 0, 2)])
    }

    #[test]
    fn test_endpoint_lookup() {
        assert_eq!(state().endpoint("modbus1").unwrap().host, "10.0.0.1");
    }

    #[test]
    fn test_unknown_or_invalid_id_is_device_not_found() {
        let state = state();
        assert_eq!(
            state.endpoint("modbus9").unwrap_err(),
            DomainError::DeviceNotFound("modbus9".into())
        );
        assert!(matches!(
            state.endpoint("bad id"),
            Err(DomainError::DeviceNotFound(_))
        ));
    }
}
