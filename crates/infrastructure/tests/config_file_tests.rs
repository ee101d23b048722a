use std::collections::HashMap;
use std::io::Write;

use domain::snapshot::FailurePolicy;
use infrastructure::GatewayConfig;

const DEFAULT_TOML: &str = r#"
simulate = false

[http]
port = 9000

[poll]
interval_ms = 2000
failure_policy = "clear"

[poll.backoff]
max_ms = 30000
max_attempts = 8

[[devices]]
id = "press-1"
host = "192.168.10.21"
port = 502
start_address = 40001
count = 4
unit_id = 3
one_based = true

[[devices]]
id = "press-2"
host = "192.168.10.22"
port = 502
start_address = 0
count = 2
"#;

fn write_config(dir: &tempfile::TempDir, name: &str, contents: &str) {
    let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
}

#[test]
fn loads_devices_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    write_config(&dir, "default.toml", DEFAULT_TOML);

    let config =
        GatewayConfig::load_from(dir.path().to_str().unwrap(), Some(HashMap::new())).unwrap();

    assert_eq!(config.http.port, 9000);
    assert_eq!(config.poll.interval_ms, 2000);
    assert_eq!(config.poll.read_timeout_ms, 10_000);
    assert_eq!(config.poll.failure_policy, FailurePolicy::Clear);
    assert_eq!(config.poll.backoff.initial_ms, 1000);
    assert_eq!(config.poll.backoff.max_ms, 30_000);
    assert_eq!(config.poll.backoff.max_attempts, Some(8));

    assert_eq!(config.devices.len(), 2);
    let press1 = &config.devices[0];
    assert_eq!(press1.id.as_str(), "press-1");
    assert_eq!(press1.unit_id, 3);
    assert_eq!(press1.wire_address().unwrap(), 40000);
    assert_eq!(config.devices[1].unit_id, 1);
}

#[test]
fn file_devices_take_precedence_over_legacy_env() {
    let dir = tempfile::tempdir().unwrap();
    write_config(&dir, "default.toml", DEFAULT_TOML);

    let env: HashMap<String, String> = [
        ("MACHINE_1_IP", "10.0.0.5"),
        ("MACHINE_1_PORT", "502"),
        ("MACHINE_1_START_ADDRESS", "1"),
        ("MACHINE_1_READ_COUNT", "1"),
        ("APP_PORT", "7000"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let config = GatewayConfig::load_from(dir.path().to_str().unwrap(), Some(env)).unwrap();

    assert_eq!(config.devices[0].id.as_str(), "press-1");
    assert_eq!(config.http.port, 9000);
}

#[test]
fn run_mode_file_overrides_default() {
    let dir = tempfile::tempdir().unwrap();
    write_config(&dir, "default.toml", DEFAULT_TOML);
    write_config(&dir, "production.toml", "[poll]\ninterval_ms = 10000\n");

    let env: HashMap<String, String> =
        [("RUN_MODE".to_string(), "production".to_string())].into_iter().collect();

    let config = GatewayConfig::load_from(dir.path().to_str().unwrap(), Some(env)).unwrap();
    assert_eq!(config.poll.interval_ms, 10_000);
    assert_eq!(config.poll.failure_policy, FailurePolicy::Clear);
}

#[test]
fn duplicate_device_ids_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        &dir,
        "default.toml",
        &DEFAULT_TOML.replace("id = \"press-2\"", "id = \"press-1\""),
    );

    let err = GatewayConfig::load_from(dir.path().to_str().unwrap(), Some(HashMap::new()))
        .unwrap_err();
    assert!(err.to_string().contains("Duplicate device id"));
}
