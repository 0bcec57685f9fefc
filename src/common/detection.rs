use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

pub type LabelSet = BTreeSet<String>;

/// Output of one inference call for one camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
    pub camera_id: String,
    pub labels: LabelSet,
    pub captured_at: DateTime<Utc>,
}

impl DetectionResult {
    pub fn new(camera_id: impl Into<String>, labels: LabelSet, captured_at: DateTime<Utc>) -> Self {
        Self {
            camera_id: camera_id.into(),
            labels,
            captured_at,
        }
    }

    /// Keeps only labels in `watched`; an empty `watched` set keeps everything.
    pub fn retain_watched(mut self, watched: &LabelSet) -> Self {
        if !watched.is_empty() {
            self.labels.retain(|label| watched.contains(label));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
