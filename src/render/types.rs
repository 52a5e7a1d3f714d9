//! Core types for render generation.

use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The model every render goes through ("Nano Banana Pro").
pub const MODEL_NAME: &str = "gemini-3-pro-image-preview";

// The hidden system prompts. Operators never see or edit these; the mode
// picks one of the two.
const SYSTEM_PROMPT_SINGLE: &str = "3D product render, centered on seamless beige gradient background, soft studio lighting, clean minimalist style, floating presentation, warm neutral tones, photorealistic, sharp focus, 1:1 square format, commercial quality.";

const SYSTEM_PROMPT_MIX: &str = "3D rendered full body model wearing the provided outfit, use provided face for realistic head, centered on seamless beige gradient background, soft studio lighting, photorealistic human render, natural standing pose, full body visible head to toe, warm neutral tones, fashion catalog style, sharp focus, 9:16 vertical format, professional quality";

/// Generation variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One reference image, square photorealistic product render.
    Single,
    /// Up to ten reference images, vertical full-body composite render.
    Mix,
}

impl Mode {
    /// Maximum number of reference images this mode accepts.
    pub fn max_references(&self) -> usize {
        match self {
            Self::Single => 1,
            Self::Mix => 10,
        }
    }

    /// The fixed system prompt applied for this mode.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::Single => SYSTEM_PROMPT_SINGLE,
            Self::Mix => SYSTEM_PROMPT_MIX,
        }
    }

    /// Returns the mode identifier used on the wire and in the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Mix => "mix",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "single" => Ok(Self::Single),
            "mix" => Ok(Self::Mix),
            other => Err(StudioError::InvalidRequest(format!(
                "unknown mode '{other}', expected 'single' or 'mix'"
            ))),
        }
    }
}

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Parses a MIME type string.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(Self::Png),
            "image/jpeg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
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

/// An uploaded reference image.
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Detected image format.
    pub format: ImageFormat,
    /// Original filename, if known.
    pub name: Option<String>,
}

impl ReferenceImage {
    /// Creates a reference image, detecting the format from magic bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let format = ImageFormat::from_magic_bytes(&data)
            .ok_or_else(|| StudioError::InvalidRequest("unrecognized image format".into()))?;
        Ok(Self {
            data,
            format,
            name: None,
        })
    }

    /// Attaches the original filename.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// MIME type for the detected format.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// A request to render from reference images.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Generation variant, selects the system prompt and reference cap.
    pub mode: Mode,
    /// Ordered reference images, already clamped to the mode's cap.
    pub references: Vec<ReferenceImage>,
}

impl RenderRequest {
    /// Creates an empty request for the given mode.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            references: Vec::new(),
        }
    }

    /// Adds one reference image.
    pub fn with_reference(mut self, reference: ReferenceImage) -> Self {
        self.references.push(reference);
        self
    }

    /// Replaces the reference list.
    pub fn with_references(mut self, references: Vec<ReferenceImage>) -> Self {
        self.references = references;
        self
    }

    /// Checks the request against the mode's reference cap.
    pub fn validate(&self) -> Result<()> {
        if self.references.is_empty() {
            return Err(StudioError::InvalidRequest(
                "at least one reference image is required".into(),
            ));
        }
        let max = self.mode.max_references();
        if self.references.len() > max {
            return Err(StudioError::InvalidRequest(format!(
                "{} mode accepts at most {} reference image(s), got {}",
                self.mode,
                max,
                self.references.len()
            )));
        }
        Ok(())
    }
}

/// Metadata about the render.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderMetadata {
    /// Model used.
    pub model: Option<String>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// A finished render with its data and metadata.
#[derive(Debug, Clone)]
#[must_use = "rendered image should be saved or displayed"]
pub struct RenderedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Image format.
    pub format: ImageFormat,
    /// Render metadata.
    pub metadata: RenderMetadata,
}

impl RenderedImage {
    /// Creates a new rendered image.
    pub fn new(data: Vec<u8>, format: ImageFormat, metadata: RenderMetadata) -> Self {
        Self {
            data,
            format,
            metadata,
        }
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Saves the image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the image as a data URL, the displayable form the UI uses.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            self.to_base64()
        )
    }
}
