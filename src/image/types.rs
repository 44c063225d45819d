//! Core types for uploads, output options and generated results.

use crate::error::{GenFormError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// File types the upload slots advertise to file pickers. Not enforced.
pub const ACCEPT_HINT: &[&str] = &["image/png", "image/jpeg", "image/jpg"];

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
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

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }

    fn from_decoder(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }
}

/// Output dimensions offered by the size radio group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum OutputSize {
    /// 1024x1024 square.
    #[default]
    #[serde(rename = "1024x1024")]
    Square,
    /// 1536x1024 landscape.
    #[serde(rename = "1536x1024")]
    Landscape,
    /// 1024x1536 portrait.
    #[serde(rename = "1024x1536")]
    Portrait,
    /// Let the service decide.
    #[serde(rename = "auto")]
    Auto,
}

impl OutputSize {
    /// All options, in display order.
    pub const ALL: [Self; 4] = [Self::Square, Self::Landscape, Self::Portrait, Self::Auto];

    /// Returns the wire value sent in the `size` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1024x1024",
            Self::Landscape => "1536x1024",
            Self::Portrait => "1024x1536",
            Self::Auto => "auto",
        }
    }
}

impl std::fmt::Display for OutputSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputSize {
    type Err = GenFormError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s.trim())
            .ok_or_else(|| GenFormError::InvalidValue {
                field: "size",
                value: s.to_string(),
            })
    }
}

/// Output quality offered by the quality radio group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputQuality {
    /// Fastest, lowest fidelity.
    Low,
    /// Balanced.
    #[default]
    Medium,
    /// Highest fidelity.
    High,
    /// Let the service decide.
    Auto,
}

impl OutputQuality {
    /// All options, in display order.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Auto];

    /// Returns the wire value sent in the `quality` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Auto => "auto",
        }
    }
}

impl std::fmt::Display for OutputQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputQuality {
    type Err = GenFormError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| GenFormError::InvalidValue {
                field: "quality",
                value: s.to_string(),
            })
    }
}

/// A file chosen for upload: its name and raw contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File name presented to the service.
    pub name: String,
    /// Raw file bytes, sent as-is.
    pub data: Vec<u8>,
}

impl SourceFile {
    /// Creates a source file from in-memory bytes.
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Reads a file from disk.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self { name, data })
    }

    /// Best-effort MIME type: magic bytes first, then the file extension.
    pub fn mime_type(&self) -> &'static str {
        ImageFormat::from_magic_bytes(&self.data)
            .or_else(|| {
                Path::new(&self.name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .and_then(ImageFormat::from_extension)
            })
            .map(|f| f.mime_type())
            .unwrap_or("application/octet-stream")
    }

    /// Size of the file in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Decoded preview of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    /// Format the decoder recognised.
    pub format: ImageFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `data:` URI of the original bytes.
    pub data_url: String,
}

impl Preview {
    /// Decodes the image header of `file` and builds a data URI preview.
    ///
    /// Only the header is read, so this is cheap even for large uploads.
    pub fn decode(file: &SourceFile) -> Result<Self> {
        let reader = image::ImageReader::new(std::io::Cursor::new(file.data.as_slice()))
            .with_guessed_format()?;

        let format = reader
            .format()
            .and_then(ImageFormat::from_decoder)
            .ok_or_else(|| {
                GenFormError::Decode(format!("{} is not a PNG, JPEG or WebP image", file.name))
            })?;

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| GenFormError::Decode(format!("{}: {e}", file.name)))?;

        Ok(Self {
            format,
            width,
            height,
            data_url: data_url(format.mime_type(), &file.data),
        })
    }
}

/// Identifier of one generated result, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultId(u64);

impl ResultId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ResultId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "result-{}", self.0)
    }
}

/// An image returned by the service, held locally until replaced.
#[derive(Debug, Clone)]
#[must_use = "generated image should be saved or processed"]
pub struct GeneratedImage {
    /// Local reference to this result.
    pub id: ResultId,
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Format sniffed from the bytes (PNG if unrecognised).
    pub format: ImageFormat,
}

impl GeneratedImage {
    /// File name used by the download action.
    pub const DOWNLOAD_FILE_NAME: &'static str = "generated-image.png";

    /// Wraps a response body. The content type is not consulted.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let format = ImageFormat::from_magic_bytes(&data).unwrap_or_default();
        Self {
            id: ResultId::next(),
            data,
            format,
        }
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Saves the image to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        tokio::fs::write(path, &self.data).await?;
        Ok(())
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        data_url(self.format.mime_type(), &self.data)
    }
}

fn data_url(mime: &str, data: &[u8]) -> String {
    use base64::Engine;
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(data)
    )
}
