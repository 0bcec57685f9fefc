pub mod common;
pub mod config;
pub mod error;
pub mod inference;
pub mod intake;
pub mod monitor;
pub mod scheduler;
pub mod status;

#[cfg(test)]
mod testing;

pub use common::{CameraConfig, CameraStatusSnapshot, DetectionResult, LabelSet, SnapshotStatus};
pub use config::Configuration;
pub use error::{AppError, CaptureError, ConfigError, InferenceError};
pub use inference::{HttpInferenceGateway, InferenceGateway, InferenceServiceBuilder};
pub use intake::{FrameSampler, SamplerFactory, UriSamplerFactory};
pub use monitor::{AlertState, AlertStatus, CameraMonitor};
pub use scheduler::{MonitorScheduler, MonitorSchedulerBuilder};
pub use status::{StatusBoard, StatusSink};
