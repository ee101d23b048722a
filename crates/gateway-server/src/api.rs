use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use domain::snapshot::{DeviceStatus, Snapshot};
use domain::{DeviceEndpoint, DeviceId, DomainError};

use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/modbus-data", get(get_modbus_data))
        .route("/api/devices", get(get_devices))
        .route("/api/devices/{id}", get(get_device))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// One device as exposed by the structured API
#[derive(Debug, Serialize)]
pub struct DeviceView {
    pub id: DeviceId,
    pub endpoint: String,
    pub start_address: u16,
    pub count: u16,
    pub values: Option<Vec<i64>>,
    pub captured_at: Option<DateTime<Utc>>,
    pub status: DeviceStatus,
}

impl DeviceView {
    fn from_snapshot(endpoint: &DeviceEndpoint, snapshot: &Snapshot) -> Self {
        let slot = snapshot.device(&endpoint.id);
        let reading = slot.and_then(|s| s.reading.as_ref());

        Self {
            id: endpoint.id.clone(),
            endpoint: endpoint.authority(),
            start_address: endpoint.start_address,
            count: endpoint.count,
            values: reading.map(|r| r.values().to_vec()),
            captured_at: reading.map(|r| r.captured_at()),
            status: slot.map(|s| s.status.clone()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DevicesResponse {
    pub cycle: u64,
    pub captured_at: Option<DateTime<Utc>>,
    pub devices: Vec<DeviceView>,
}

async fn healthcheck() -> impl IntoResponse {
    Json(json!({ "status": "Online." }))
}

/// Legacy endpoint: every device's values as a bracketed string, or a flat 500.
async fn get_modbus_data(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.store.snapshot();

    let Some(readings) = snapshot.complete_readings() else {
        warn!(cycle = snapshot.cycle(), "Modbus data requested while a device has no reading");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Data not available" })),
        )
            .into_response();
    };

    let body: Map<String, Value> = readings
        .iter()
        .map(|(id, reading)| (format!("{}_data", id), Value::String(reading.legacy_format())))
        .collect();

    (StatusCode::OK, Json(Value::Object(body))).into_response()
}

async fn get_devices(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.store.snapshot();
    let devices = state
        .devices
        .iter()
        .map(|endpoint| DeviceView::from_snapshot(endpoint, &snapshot))
        .collect();

    Json(DevicesResponse {
        cycle: snapshot.cycle(),
        captured_at: snapshot.captured_at(),
        devices,
    })
}

async fn get_device(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DeviceView>, ApiError> {
    let endpoint = state.endpoint(&id)?;
    let snapshot = state.store.snapshot();
    Ok(Json(DeviceView::from_snapshot(endpoint, &snapshot)))
}

/// Maps domain errors onto HTTP responses
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            DomainError::DeviceNotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Device not found" })),
            )
                .into_response(),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": other.to_string() })),
            )
                .into_response(),
        }
    }
}
