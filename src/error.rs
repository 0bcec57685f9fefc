use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("The monitor scheduler is no longer running.")]
    SchedulerStopped,
    #[error("Failed to initialise logging: {0}")]
    Logging(String),
    #[error("Failed to build HTTP client: {0}")]
    Http(String),
}

// Raised synchronously to whoever registers a camera or loads configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("camera_id must not be empty")]
    EmptyCameraId,
    #[error("camera {0} has an empty source_uri")]
    EmptySourceUri(String),
    #[error("camera {0} has a zero sample interval")]
    ZeroSampleInterval(String),
    #[error("cooldown duration must be greater than zero")]
    ZeroCooldown,
    #[error("invalid inference endpoint {0}")]
    InvalidEndpoint(String),
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(e: config::ConfigError) -> Self {
        ConfigError::Load(e.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Frame source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("Frame source returned an empty buffer")]
    EmptyFrame,
    #[error("Failed to decode frame: {0}")]
    Decode(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("Inference unavailable: {0}")]
    Unavailable(String),
    #[error("Inference rejected the frame: {0}")]
    Rejected(String),
}

impl InferenceError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, InferenceError::Unavailable(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, InferenceError::Rejected(_))
    }
}
