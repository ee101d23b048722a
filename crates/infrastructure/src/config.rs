use std::collections::{HashMap, HashSet};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use domain::device::{DeviceEndpoint, DeviceId};
use domain::snapshot::FailurePolicy;
use serde::{Deserialize, Serialize};

use crate::drivers::{SimulatorConfig, TransportTimeouts};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BackoffConfig {
    pub initial_ms: u64,
    pub max_ms: u64,
    /// Consecutive failures after which a device is reported as failed
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PollConfig {
    pub interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub failure_policy: FailurePolicy,
    pub backoff: BackoffConfig,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeouts(&self) -> TransportTimeouts {
        TransportTimeouts {
            connect: Duration::from_millis(self.connect_timeout_ms),
            read: Duration::from_millis(self.read_timeout_ms),
        }
    }

    /// Bound on one whole connect-and-read attempt.
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.saturating_add(self.read_timeout_ms))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GatewayConfig {
    pub http: HttpConfig,
    pub poll: PollConfig,
    #[serde(default)]
    pub devices: Vec<DeviceEndpoint>,
    /// Serve simulated registers instead of talking to real devices
    #[serde(default)]
    pub simulate: bool,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

impl GatewayConfig {
    /// Load configuration from `config_dir` and the process environment.
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        Self::load_from(config_dir, None)
    }

    /// Same as [`GatewayConfig::load`], reading variables from `env` instead of the
    /// process environment when given.
    pub fn load_from(
        config_dir: &str,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let run_mode = match &env {
            Some(vars) => vars.get("RUN_MODE").cloned(),
            None => std::env::var("RUN_MODE").ok(),
        }
        .unwrap_or_else(|| "development".into());

        let s = Config::builder()
            .set_default("http.host", "0.0.0.0")?
            .set_default("http.port", 8080)?
            .set_default("poll.interval_ms", 5000)?
            .set_default("poll.connect_timeout_ms", 10_000)?
            .set_default("poll.read_timeout_ms", 10_000)?
            .set_default("poll.failure_policy", "retain")?
            .set_default("poll.backoff.initial_ms", 1000)?
            .set_default("poll.backoff.max_ms", 60_000)?
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Environment variables (e.g. GATEWAY__HTTP__PORT=9000)
            .add_source(
                Environment::with_prefix("GATEWAY")
                    .separator("__")
                    .try_parsing(true)
                    .source(env.clone()),
            )
            .build()?;

        let mut config: GatewayConfig = s.try_deserialize()?;

        if config.devices.is_empty() {
            let vars = match env {
                Some(vars) => vars,
                None => std::env::vars().collect(),
            };
            config.apply_legacy_env(&vars)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Read the flat `MACHINE_<n>_*` / `APP_PORT` / `USE_MODSIM` variables.
    ///
    /// Devices are numbered from 1 and named `modbus<n>`; numbering stops at the
    /// first missing `MACHINE_<n>_IP`.
    fn apply_legacy_env(&mut self, vars: &HashMap<String, String>) -> Result<(), ConfigError> {
        let one_based = match vars.get("USE_MODSIM") {
            Some(raw) => parse_legacy_bool("USE_MODSIM", raw)?,
            None => false,
        };

        let mut devices = Vec::new();
        for n in 1.. {
            let Some(host) = vars.get(&format!("MACHINE_{n}_IP")) else {
                break;
            };

            let field = |suffix: &str| -> Result<u16, ConfigError> {
                let key = format!("MACHINE_{n}_{suffix}");
                let raw = vars
                    .get(&key)
                    .ok_or_else(|| ConfigError::NotFound(key.clone()))?;
                parse_var::<u16>(&key, raw)
            };

            let id = DeviceId::new(format!("modbus{n}"))
                .map_err(|e| ConfigError::Message(e.to_string()))?;
            let endpoint = DeviceEndpoint::new(
                id,
                host.trim(),
                field("PORT")?,
                field("START_ADDRESS")?,
                field("READ_COUNT")?,
            )
            .with_one_based(one_based);

            devices.push(endpoint);
        }

        if let Some(raw) = vars.get("APP_PORT") {
            self.http.port = parse_var::<u16>("APP_PORT", raw)?;
        }

        self.devices = devices;
        Ok(())
    }

    /// Reject anything the poller or the HTTP layer cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.devices.is_empty() {
            return Err(ConfigError::Message(
                "No devices configured (set devices in the config file or MACHINE_1_IP...)".into(),
            ));
        }

        let mut seen = HashSet::new();
        for device in &self.devices {
            if !seen.insert(&device.id) {
                return Err(ConfigError::Message(format!(
                    "Duplicate device id: {}",
                    device.id
                )));
            }
            device
                .validate()
                .map_err(|e| ConfigError::Message(e.to_string()))?;
        }

        if self.poll.interval_ms == 0 {
            return Err(ConfigError::Message("poll.interval_ms must be > 0".into()));
        }
        if self.poll.connect_timeout_ms == 0 || self.poll.read_timeout_ms == 0 {
            return Err(ConfigError::Message("poll timeouts must be > 0".into()));
        }
        if self.poll.backoff.initial_ms == 0
            || self.poll.backoff.initial_ms > self.poll.backoff.max_ms
        {
            return Err(ConfigError::Message(
                "poll.backoff requires 0 < initial_ms <= max_ms".into(),
            ));
        }
        if self.poll.backoff.max_attempts == Some(0) {
            return Err(ConfigError::Message(
                "poll.backoff.max_attempts must be > 0 when set".into(),
            ));
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::Message(format!("Cannot parse {}={:?}: {}", key, raw, e)))
}

/// Boolean spellings accepted by the legacy deployment: `1`/`t`/`true` and
/// `0`/`f`/`false`, in lower, upper or title case.
fn parse_legacy_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        other => Err(ConfigError::Message(format!(
            "Cannot parse {}={:?}: expected a boolean",
            key, other
        ))),
    }
}
