use crate::common::EncodedFrame;
use crate::error::CaptureError;
use async_trait::async_trait;
use chrono::Utc;

/// Pulls the current frame of one camera feed as an encoded still image.
#[async_trait]
pub trait FrameSampler: Send + Sync {
    async fn sample(&mut self) -> Result<EncodedFrame, CaptureError>;
}

/// Validates a freshly read buffer on the blocking pool so a large frame does
/// not stall the monitor tasks sharing this worker.
pub(crate) async fn decode_frame(
    camera_id: String,
    bytes: Vec<u8>,
) -> Result<EncodedFrame, CaptureError> {
    if bytes.is_empty() {
        return Err(CaptureError::EmptyFrame);
    }
    let captured_at = Utc::now();
    tokio::task::spawn_blocking(move || EncodedFrame::decode(camera_id, bytes, captured_at))
        .await
        .map_err(|e| CaptureError::SourceUnavailable(format!("decode task failed: {}", e)))?
}
