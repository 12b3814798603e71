//! Core types for text generation.

use crate::error::{MedScanError, Result};
use serde::Serialize;

/// Raster formats accepted as inline model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Raster image attached to a prompt.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Detected or known image format.
    pub format: ImageFormat,
}

impl ImageAttachment {
    /// Creates an attachment, detecting the format from magic bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let format = ImageFormat::from_magic_bytes(&data)
            .ok_or_else(|| MedScanError::Decode("unrecognized image format".into()))?;
        Ok(Self { data, format })
    }

    /// Creates an attachment from bytes known to be PNG-encoded.
    pub fn png(data: Vec<u8>) -> Self {
        Self {
            data,
            format: ImageFormat::Png,
        }
    }

    /// Returns the MIME type to advertise for this attachment.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Sampling configuration sent on every generation call.
///
/// The default is pinned deterministic so repeated scans of the same image
/// compare cleanly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling mass.
    pub top_p: f32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 1.0,
            max_output_tokens: 2048,
        }
    }
}

/// A request to generate text, optionally grounded on an image.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    /// The assembled prompt text.
    pub prompt: String,
    /// Optional image to submit alongside the prompt.
    pub image: Option<ImageAttachment>,
    /// Sampling configuration for this call.
    pub sampling: SamplingConfig,
}

impl PromptRequest {
    /// Creates a new request with the given prompt and default sampling.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            sampling: SamplingConfig::default(),
        }
    }

    /// Attaches an image to the request.
    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }

    /// Overrides the sampling configuration.
    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }
}

/// Text returned by a model, with attribution.
#[derive(Debug, Clone, Serialize)]
pub struct ModelReply {
    /// The generated text.
    pub text: String,
    /// Identifier of the model that produced it.
    pub model: String,
    /// Wall-clock duration of the call in milliseconds.
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"not an image"), None);
    }

    #[test]
    fn test_attachment_from_bytes() {
        let attachment = ImageAttachment::from_bytes(JPEG_MAGIC.to_vec()).unwrap();
        assert_eq!(attachment.format, ImageFormat::Jpeg);
        assert_eq!(attachment.mime_type(), "image/jpeg");

        assert!(ImageAttachment::from_bytes(vec![0; 4]).is_err());
    }

    #[test]
    fn test_default_sampling_is_deterministic() {
        let sampling = SamplingConfig::default();
        assert_eq!(sampling.temperature, 0.0);
        assert_eq!(sampling.top_p, 1.0);
        assert_eq!(sampling.max_output_tokens, 2048);
    }

    #[test]
    fn test_request_builders() {
        let request = PromptRequest::new("What is paracetamol for?")
            .with_image(ImageAttachment::png(PNG_MAGIC.to_vec()));
        assert!(request.image.is_some());
        assert_eq!(request.sampling, SamplingConfig::default());
    }
}
