//! Image service trait and the submission it consumes.

use crate::error::Result;
use crate::image::types::{GeneratedImage, OutputQuality, OutputSize, SourceFile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which service route a submission goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Text-to-image, used when no images are attached.
    Generate,
    /// Image(+text)-to-image, used when one or more images are attached.
    Edit,
}

impl Route {
    /// Picks the route for a submission carrying `count` images.
    pub fn for_image_count(count: usize) -> Self {
        if count > 0 {
            Self::Edit
        } else {
            Self::Generate
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generate => write!(f, "generate"),
            Self::Edit => write!(f, "edit"),
        }
    }
}

/// Snapshot of the form taken when a submission starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Prompt as typed (not trimmed).
    pub prompt: String,
    /// Requested output size.
    pub size: OutputSize,
    /// Requested output quality.
    pub quality: OutputQuality,
    /// Attached images in slot order.
    pub images: Vec<SourceFile>,
}

impl Submission {
    /// Route selected by whether any images are attached.
    pub fn route(&self) -> Route {
        Route::for_image_count(self.images.len())
    }

    /// Text fields in the order they are sent.
    pub fn text_fields(&self) -> [(&'static str, &str); 3] {
        [
            ("prompt", self.prompt.as_str()),
            ("size", self.size.as_str()),
            ("quality", self.quality.as_str()),
        ]
    }
}

/// An external service that turns a submission into an image.
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Sends one submission. Never retries.
    async fn submit(&self, submission: &Submission) -> Result<GeneratedImage>;

    /// Checks if the service is reachable.
    async fn health_check(&self) -> Result<()>;
}
