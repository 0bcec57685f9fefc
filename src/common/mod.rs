pub mod camera;
pub mod detection;
pub mod frame;
pub mod snapshot;

pub use camera::{CameraConfig, DEFAULT_SAMPLE_INTERVAL};
pub use detection::{DetectionResult, LabelSet};
pub use frame::EncodedFrame;
pub use snapshot::{CameraStatusSnapshot, SnapshotStatus};
