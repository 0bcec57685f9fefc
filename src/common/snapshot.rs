use crate::common::LabelSet;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotStatus {
    Safe,
    Alert,
    CooldownActive,
    ModelError,
    CaptureError,
}

impl SnapshotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotStatus::Safe => "SAFE",
            SnapshotStatus::Alert => "ALERT",
            SnapshotStatus::CooldownActive => "COOLDOWN_ACTIVE",
            SnapshotStatus::ModelError => "MODEL_ERROR",
            SnapshotStatus::CaptureError => "CAPTURE_ERROR",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SnapshotStatus::ModelError | SnapshotStatus::CaptureError)
    }
}

impl fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only result of one monitor cycle. The next snapshot for the same
/// camera supersedes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraStatusSnapshot {
    pub camera_id: String,
    pub status: SnapshotStatus,
    pub labels: LabelSet,
    pub updated_at: DateTime<Utc>,
}

impl CameraStatusSnapshot {
    pub fn new(
        camera_id: impl Into<String>,
        status: SnapshotStatus,
        labels: LabelSet,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            camera_id: camera_id.into(),
            status,
            labels,
            updated_at,
        }
    }
}
