//! Image uploads, results and the service they are exchanged with.

mod http;
mod service;
mod types;

pub use http::{HttpImageService, HttpImageServiceBuilder};
pub use service::{ImageService, Route, Submission};
pub use types::{
    GeneratedImage, ImageFormat, OutputQuality, OutputSize, Preview, ResultId, SourceFile,
    ACCEPT_HINT,
};
