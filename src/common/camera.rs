use crate::error::ConfigError;
use std::time::Duration;

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

/// One monitored video source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConfig {
    camera_id: String,
    source_uri: String,
    sample_interval: Duration,
}

impl CameraConfig {
    pub fn new(
        camera_id: impl Into<String>,
        source_uri: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let camera_id = camera_id.into();
        if camera_id.trim().is_empty() {
            return Err(ConfigError::EmptyCameraId);
        }
        let source_uri = source_uri.into();
        if source_uri.trim().is_empty() {
            return Err(ConfigError::EmptySourceUri(camera_id));
        }
        Ok(Self {
            camera_id,
            source_uri,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        })
    }

    pub fn with_sample_interval(mut self, sample_interval: Duration) -> Result<Self, ConfigError> {
        if sample_interval.is_zero() {
            return Err(ConfigError::ZeroSampleInterval(self.camera_id));
        }
        self.sample_interval = sample_interval;
        Ok(self)
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    pub fn source_uri(&self) -> &str {
        &self.source_uri
    }

    pub fn sample_interval(&self) -> Duration {
        self.sample_interval
    }
}
