/*!
 * Encoded image payloads.
 *
 * An `EncodedImage` is the base64 payload plus MIME type that every inference
 * backend receives. It is produced either from a user-chosen file or from a
 * raw camera frame (encoded as JPEG). A `PreviewHandle` describes the same
 * image for display.
 */

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageFormat, ImageReader};

use crate::camera::Frame;
use crate::errors::SessionError;

/// Image payload prepared for transmission to an inference endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// MIME type of the encoded bytes, e.g. `image/jpeg`
    mime_type: String,
    /// Standard base64 encoding of the image bytes
    data: String,
}

impl EncodedImage {
    /// Build an encoded image from bytes that are already encoded (base64 is computed here)
    pub fn new(mime_type: impl Into<String>, raw: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: general_purpose::STANDARD.encode(raw),
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Base64 payload without any data-URL prefix
    pub fn base64(&self) -> &str {
        &self.data
    }

    /// `data:<mime>;base64,<payload>` form used by OpenAI-style APIs
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Size of the decoded payload in bytes
    pub fn byte_len(&self) -> usize {
        general_purpose::STANDARD
            .decode(&self.data)
            .map(|raw| raw.len())
            .unwrap_or(0)
    }

    /// Read a local file and encode it, rejecting anything that is not an image
    pub async fn from_file(path: &Path) -> Result<(Self, PreviewHandle), SessionError> {
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| SessionError::InvalidImage(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(&raw)
    }

    /// Encode raw file bytes after sniffing their format from the content
    pub fn from_bytes(raw: &[u8]) -> Result<(Self, PreviewHandle), SessionError> {
        if raw.is_empty() {
            return Err(SessionError::InvalidImage("file is empty".to_string()));
        }

        let format = image::guess_format(raw)
            .map_err(|e| SessionError::InvalidImage(e.to_string()))?;

        let (width, height) = ImageReader::with_format(Cursor::new(raw), format)
            .into_dimensions()
            .map_err(|e| SessionError::InvalidImage(e.to_string()))?;

        let mime_type = format.to_mime_type();
        let preview = PreviewHandle {
            mime_type: mime_type.to_string(),
            width,
            height,
            byte_len: raw.len(),
        };

        Ok((Self::new(mime_type, raw), preview))
    }

    /// Snapshot a raw RGB camera frame into a JPEG payload
    pub fn from_frame(frame: &Frame, quality: u8) -> Result<(Self, PreviewHandle), SessionError> {
        let expected = frame.width as usize * frame.height as usize * 3;
        if frame.width == 0 || frame.height == 0 || frame.data.len() != expected {
            return Err(SessionError::NoFrame(format!(
                "frame of {}x{} carries {} bytes, expected {}",
                frame.width,
                frame.height,
                frame.data.len(),
                expected
            )));
        }

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality)
            .encode(&frame.data, frame.width, frame.height, ExtendedColorType::Rgb8)
            .map_err(|e| SessionError::NoFrame(e.to_string()))?;

        let mime_type = ImageFormat::Jpeg.to_mime_type();
        let preview = PreviewHandle {
            mime_type: mime_type.to_string(),
            width: frame.width,
            height: frame.height,
            byte_len: jpeg.len(),
        };

        Ok((Self::new(mime_type, &jpeg), preview))
    }
}

/// Display handle for the selected image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub byte_len: usize,
}

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kib = self.byte_len as f64 / 1024.0;
        write!(f, "{} {}x{} ({:.1} KiB)", self.mime_type, self.width, self.height, kib)
    }
}
