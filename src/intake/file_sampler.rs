use crate::common::EncodedFrame;
use crate::error::CaptureError;
use crate::intake::sampler::{FrameSampler, decode_frame};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::trace;

/// Reads the snapshot file an external grabber keeps overwriting with the
/// latest frame of a feed.
pub struct FileSnapshotSampler {
    camera_id: String,
    path: PathBuf,
}

impl FileSnapshotSampler {
    pub fn new(camera_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            camera_id: camera_id.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl FrameSampler for FileSnapshotSampler {
    async fn sample(&mut self) -> Result<EncodedFrame, CaptureError> {
        trace!("Reading frame for {} from {:?}", self.camera_id, self.path);
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            CaptureError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        decode_frame(self.camera_id.clone(), bytes).await
    }
}
