use crate::common::LabelSet;
use crate::error::{AppError, ConfigError, InferenceError};
use crate::inference::{InferenceGateway, InferenceRequest};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Client for a detection server exposing a multipart `/predict/` endpoint.
pub struct HttpInferenceGateway {
    endpoint: reqwest::Url,
    http_client: reqwest::Client,
}

// The servers in the field disagree on field names; all shapes land here.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default, alias = "labels", alias = "detections")]
    objects: Vec<String>,
}

impl HttpInferenceGateway {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, AppError> {
        let endpoint = reqwest::Url::parse(endpoint)
            .map_err(|_| ConfigError::InvalidEndpoint(endpoint.to_string()))?;
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Http(e.to_string()))?;
        Ok(Self {
            endpoint,
            http_client,
        })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

#[async_trait]
impl InferenceGateway for HttpInferenceGateway {
    async fn infer(&self, request: &InferenceRequest) -> Result<LabelSet, InferenceError> {
        let frame = &request.frame;
        let part = Part::bytes(frame.bytes().to_vec())
            .file_name(format!(
                "{}-{}.{}",
                request.camera_id,
                frame.frame_id(),
                frame.extension()
            ))
            .mime_str(frame.mime_type())
            .map_err(|e| InferenceError::Rejected(e.to_string()))?;

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .header("x-camera-id", request.camera_id.as_str())
            .multipart(Form::new().part("frame", part))
            .send()
            .await
            .map_err(|e| InferenceError::Unavailable(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| InferenceError::Unavailable(e.to_string()))?;
        debug!("Gateway answered {} for {}: {}", status, request.camera_id, body);
        interpret_response(status, &body)
    }
}

pub(crate) fn interpret_response(http_status: u16, body: &str) -> Result<LabelSet, InferenceError> {
    if (400..500).contains(&http_status) {
        return Err(InferenceError::Rejected(format!("HTTP {}", http_status)));
    }
    if !(200..300).contains(&http_status) {
        return Err(InferenceError::Unavailable(format!("HTTP {}", http_status)));
    }

    let response: PredictResponse = serde_json::from_str(body)
        .map_err(|e| InferenceError::Unavailable(format!("malformed response: {}", e)))?;

    match response.status.as_deref() {
        None | Some("DETECTED") | Some("ALERT") => Ok(response.objects.into_iter().collect()),
        Some("SAFE") => Ok(LabelSet::new()),
        Some("MODEL_ERROR") => Err(InferenceError::Unavailable(
            "gateway model is not loaded".to_string(),
        )),
        Some(status @ ("PREDICTION_ERROR" | "FILE_SAVE_ERROR")) => {
            Err(InferenceError::Rejected(status.to_string()))
        }
        Some("COOLDOWN_ACTIVE") => Err(InferenceError::Unavailable(
            "gateway skipped inference for its own cooldown".to_string(),
        )),
        Some(other) => Err(InferenceError::Unavailable(format!(
            "unknown response status {}",
            other
        ))),
    }
}
