use crate::common::CameraConfig;
use crate::error::CaptureError;
use crate::intake::{FileSnapshotSampler, FrameSampler, HttpSnapshotSampler};

/// Opens the frame source behind a camera's `source_uri`.
pub trait SamplerFactory: Send + Sync {
    fn open(&self, camera: &CameraConfig) -> Result<Box<dyn FrameSampler>, CaptureError>;
}

/// Picks a sampler from the URI scheme: `http(s)://` snapshot endpoints,
/// `file://` URIs or bare paths to a snapshot file.
#[derive(Clone, Default)]
pub struct UriSamplerFactory {
    http_client: reqwest::Client,
}

impl UriSamplerFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SamplerFactory for UriSamplerFactory {
    fn open(&self, camera: &CameraConfig) -> Result<Box<dyn FrameSampler>, CaptureError> {
        let uri = camera.source_uri();
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return Ok(Box::new(HttpSnapshotSampler::new(
                camera.camera_id(),
                uri,
                self.http_client.clone(),
            )));
        }
        if let Some(path) = uri.strip_prefix("file://") {
            return Ok(Box::new(FileSnapshotSampler::new(camera.camera_id(), path)));
        }
        match uri.split_once("://") {
            Some((scheme, _)) => Err(CaptureError::SourceUnavailable(format!(
                "unsupported source scheme {}",
                scheme
            ))),
            None => Ok(Box::new(FileSnapshotSampler::new(camera.camera_id(), uri))),
        }
    }
}
