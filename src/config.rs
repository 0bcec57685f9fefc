use crate::common::{CameraConfig, LabelSet};
use crate::error::ConfigError;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

pub const ENV_PREFIX: &str = "SENTINEL";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub cooldown_secs: u64,
    pub cycle_timeout_secs: u64,
    pub stop_grace_ms: u64,
    pub errors_are_fatal: bool,
    pub alert_labels: Vec<String>,
    pub log_level: String,
    pub snapshot_buffer_size: usize,
    pub inference: InferenceConfig,
    pub cameras: Vec<CameraEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraEntry {
    pub camera_id: String,
    pub source_uri: String,
    #[serde(default)]
    pub sample_interval_secs: Option<u64>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            cooldown_secs: 120,
            cycle_timeout_secs: 30,
            stop_grace_ms: 2000,
            errors_are_fatal: false,
            alert_labels: Vec::new(),
            log_level: "info".to_string(),
            snapshot_buffer_size: 64,
            inference: InferenceConfig::default(),
            cameras: Vec::new(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/predict/".to_string(),
            timeout_secs: 20,
        }
    }
}

impl Configuration {
    /// Reads the optional TOML file at `path`, then lets `SENTINEL__*`
    /// environment variables override it.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let configuration: Configuration = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("alert_labels")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let configuration: Configuration = Config::builder()
            .add_source(File::from_str(contents, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cooldown_secs == 0 {
            return Err(ConfigError::ZeroCooldown);
        }
        self.parse_log_level()?;
        self.camera_configs().map(|_| ())
    }

    pub fn camera_configs(&self) -> Result<Vec<CameraConfig>, ConfigError> {
        self.cameras
            .iter()
            .map(|entry| {
                let camera = CameraConfig::new(entry.camera_id.as_str(), entry.source_uri.as_str())?;
                match entry.sample_interval_secs {
                    Some(secs) => camera.with_sample_interval(Duration::from_secs(secs)),
                    None => Ok(camera),
                }
            })
            .collect()
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference.timeout_secs)
    }

    pub fn alert_label_set(&self) -> LabelSet {
        self.alert_labels
            .iter()
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .collect()
    }

    pub fn log_level(&self) -> Result<Level, ConfigError> {
        self.parse_log_level()
    }

    fn parse_log_level(&self) -> Result<Level, ConfigError> {
        self.log_level.trim().parse().map_err(|_| {
            ConfigError::Load(format!("unknown log_level {:?}", self.log_level))
        })
    }
}
