use crate::error::CaptureError;
use chrono::{DateTime, Utc};
use image::ImageFormat;
use std::sync::Arc;
use uuid::Uuid;

/// A still image pulled from a camera feed, kept in its encoded form.
#[derive(Clone, Debug)]
pub struct EncodedFrame {
    camera_id: String,
    bytes: Arc<[u8]>,
    format: ImageFormat,
    captured_at: DateTime<Utc>,
    frame_id: Uuid,
}

impl EncodedFrame {
    pub fn new(
        camera_id: impl Into<String>,
        bytes: Vec<u8>,
        format: ImageFormat,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            camera_id: camera_id.into(),
            bytes: Arc::from(bytes),
            format,
            captured_at,
            frame_id: Uuid::new_v4(),
        }
    }

    /// Validates that `bytes` hold a decodable raster image before wrapping them.
    pub fn decode(
        camera_id: impl Into<String>,
        bytes: Vec<u8>,
        captured_at: DateTime<Utc>,
    ) -> Result<Self, CaptureError> {
        if bytes.is_empty() {
            return Err(CaptureError::EmptyFrame);
        }
        let format =
            image::guess_format(&bytes).map_err(|e| CaptureError::Decode(e.to_string()))?;
        image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| CaptureError::Decode(e.to_string()))?;
        Ok(Self::new(camera_id, bytes, format, captured_at))
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn frame_id(&self) -> Uuid {
        self.frame_id
    }
}

#[cfg(test)]
pub(crate) fn test_png() -> Vec<u8> {
    use image::{DynamicImage, ImageBuffer, Rgb};
    use std::io::Cursor;

    let img = DynamicImage::ImageRgb8(ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(
        8,
        8,
        Rgb([10, 20, 30]),
    ));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("encode test png");
    buf.into_inner()
}
