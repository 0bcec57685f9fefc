use crate::common::{EncodedFrame, LabelSet};
use crate::error::InferenceError;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub camera_id: String,
    pub frame: EncodedFrame,
}

impl InferenceRequest {
    pub fn new(frame: EncodedFrame) -> Self {
        Self {
            camera_id: frame.camera_id().to_string(),
            frame,
        }
    }
}

/// The object detector behind the monitors. One gateway is shared by every
/// camera and may be called concurrently; any serialisation or rate limiting
/// is its own business.
///
/// Implementations report failures and never retry inside `infer`.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    async fn infer(&self, request: &InferenceRequest) -> Result<LabelSet, InferenceError>;
}
