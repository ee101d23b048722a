use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt;

use application::SnapshotStore;
use domain::driver::ConnectionState;
use domain::snapshot::{FailurePolicy, PollOutcome, PollReport};
use domain::{DeviceEndpoint, DeviceId, DomainError, Reading};
use gateway_server::api::create_router;
use gateway_server::state::AppState;

fn id(s: &str) -> DeviceId {
    DeviceId::new(s).unwrap()
}

fn setup() -> Arc<AppState> {
    let devices = vec![
        DeviceEndpoint::new(id("modbus1"), "10.0.0.1", 502, 99, 2),
        DeviceEndpoint::new(id("modbus2"), "10.0.0.2", 502, 99, 2),
    ];
    let store = Arc::new(SnapshotStore::new(
        devices.iter().map(|d| d.id.clone()),
        FailurePolicy::Retain,
    ));
    Arc::new(AppState::new(store, devices))
}

fn success(device: &str, values: Vec<i64>) -> PollReport {
    PollReport {
        device_id: id(device),
        outcome: PollOutcome::Reading(Reading::new(values, Utc::now())),
        connection: ConnectionState::Connected,
        consecutive_failures: 0,
        at: Utc::now(),
    }
}

fn failure(device: &str, error: DomainError) -> PollReport {
    PollReport {
        device_id: id(device),
        outcome: PollOutcome::Failed(error),
        connection: ConnectionState::Reconnecting,
        consecutive_failures: 1,
        at: Utc::now(),
    }
}

async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let response = create_router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn healthcheck_reports_online() {
    let (status, body) = get(setup(), "/healthcheck").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "Online." }));
}

#[tokio::test]
async fn modbus_data_unavailable_before_first_cycle() {
    let (status, body) = get(setup(), "/modbus-data").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Data not available" }));
}

#[tokio::test]
async fn modbus_data_unavailable_while_one_device_never_read() {
    let state = setup();
    state.store.commit(vec![
        success("modbus1", vec![10, 20]),
        failure("modbus2", DomainError::Timeout(10_000)),
    ]);

    let (status, body) = get(state, "/modbus-data").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Data not available" }));
}

#[tokio::test]
async fn modbus_data_renders_legacy_format() {
    let state = setup();
    state.store.commit(vec![
        success("modbus1", vec![10, 20]),
        success("modbus2", vec![-1, 65535]),
    ]);

    let (status, body) = get(state, "/modbus-data").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "modbus1_data": "[10 20]", "modbus2_data": "[-1 65535]" })
    );
}

#[tokio::test]
async fn modbus_data_keeps_stale_value_under_retain() {
    let state = setup();
    state.store.commit(vec![
        success("modbus1", vec![1, 2]),
        success("modbus2", vec![3, 4]),
    ]);
    state.store.commit(vec![
        success("modbus1", vec![5, 6]),
        failure("modbus2", DomainError::Connection("refused".into())),
    ]);

    for _ in 0..3 {
        let (status, body) = get(state.clone(), "/modbus-data").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "modbus1_data": "[5 6]", "modbus2_data": "[3 4]" })
        );
    }
}

#[tokio::test]
async fn devices_lists_values_and_status_in_order() {
    let state = setup();
    state.store.commit(vec![
        success("modbus1", vec![10, 20]),
        failure("modbus2", DomainError::MalformedPayload("odd length 3".into())),
    ]);

    let (status, body) = get(state, "/api/devices").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cycle"], 1);

    let devices = body["devices"].as_array().unwrap();
    assert_eq!(devices.len(), 2);

    assert_eq!(devices[0]["id"], "modbus1");
    assert_eq!(devices[0]["endpoint"], "10.0.0.1:502");
    assert_eq!(devices[0]["values"], json!([10, 20]));
    assert_eq!(devices[0]["status"]["connection"], "connected");

    assert_eq!(devices[1]["id"], "modbus2");
    assert_eq!(devices[1]["values"], Value::Null);
    assert_eq!(devices[1]["status"]["connection"], "reconnecting");
    assert_eq!(devices[1]["status"]["consecutive_failures"], 1);
    assert_eq!(
        devices[1]["status"]["last_failure"]["kind"],
        "malformed_payload"
    );
}

#[tokio::test]
async fn device_by_id() {
    let state = setup();
    state.store.commit(vec![success("modbus2", vec![7, 8])]);

    let (status, body) = get(state, "/api/devices/modbus2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "modbus2");
    assert_eq!(body["values"], json!([7, 8]));
    assert_eq!(body["start_address"], 99);
    assert!(body["captured_at"].is_string());
}

#[tokio::test]
async fn unknown_device_is_not_found() {
    let (status, body) = get(setup(), "/api/devices/plc9").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Device not found" }));

    let (status, _) = get(setup(), "/api/devices/not%20valid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
