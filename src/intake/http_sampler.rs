use crate::common::EncodedFrame;
use crate::error::CaptureError;
use crate::intake::sampler::{FrameSampler, decode_frame};
use async_trait::async_trait;

/// Fetches a still image from a camera's HTTP snapshot endpoint.
pub struct HttpSnapshotSampler {
    camera_id: String,
    url: String,
    http_client: reqwest::Client,
}

impl HttpSnapshotSampler {
    pub fn new(
        camera_id: impl Into<String>,
        url: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            camera_id: camera_id.into(),
            url: url.into(),
            http_client,
        }
    }
}

#[async_trait]
impl FrameSampler for HttpSnapshotSampler {
    async fn sample(&mut self) -> Result<EncodedFrame, CaptureError> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CaptureError::SourceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CaptureError::SourceUnavailable(format!(
                "snapshot endpoint returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CaptureError::SourceUnavailable(e.to_string()))?;
        decode_frame(self.camera_id.clone(), bytes.to_vec()).await
    }
}
