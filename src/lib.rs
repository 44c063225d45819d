#![warn(missing_docs)]
//! GenForm - upload-and-generate form for image generation services.
//!
//! The form holds up to four uploaded images, a prompt and two output
//! options. Submitting it sends one `multipart/form-data` request to an
//! external service: the generate route when no images are attached, the
//! edit route otherwise. The returned image is kept locally until the next
//! successful submission or the next image selection.
//!
//! # Quick Start
//!
//! ```no_run
//! use genform::{FormController, HttpImageService, OutputQuality};
//!
//! #[tokio::main]
//! async fn main() -> genform::Result<()> {
//!     let service = HttpImageService::builder()
//!         .base_url("http://localhost:5000")
//!         .build()?;
//!     let mut form = FormController::new(service);
//!
//!     form.select_image_path(0, "cat.png").await?;
//!     form.set_prompt("Give the cat a tiny wizard hat");
//!     form.set_quality(OutputQuality::High);
//!
//!     form.submit().await?;
//!     form.save_result(".").await?;
//!     Ok(())
//! }
//! ```
//!
//! The state machine itself ([`FormState`]) has no I/O and can be driven
//! directly by any front end.

pub mod config;
mod error;
pub mod form;
pub mod image;
pub mod session;

#[cfg(test)]
mod testing;

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use error::{GenFormError, Result};
pub use form::{FormController, FormState, ImageSlot, Lifecycle, SlotId, MAX_IMAGES};
pub use image::{
    GeneratedImage, HttpImageService, HttpImageServiceBuilder, ImageFormat, ImageService,
    OutputQuality, OutputSize, Preview, Route, SourceFile, Submission,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{GenFormError, Result};
    pub use crate::form::{FormController, FormState};
    pub use crate::image::{
        GeneratedImage, HttpImageService, ImageService, OutputQuality, OutputSize, SourceFile,
    };
}
