//! Shared fixtures for unit tests.

use crate::error::{GenFormError, Result};
use crate::image::{GeneratedImage, ImageService, Submission};
use async_trait::async_trait;
use std::io::Cursor;
use std::sync::Mutex;

pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, image::ImageFormat::Png)
}

pub(crate) fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, image::ImageFormat::Jpeg)
}

fn encode(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([73, 109, 137]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// Service double that records every submission and answers from a script.
pub(crate) struct RecordingService {
    pub submissions: Mutex<Vec<Submission>>,
    reply: Mutex<Reply>,
}

pub(crate) enum Reply {
    Image(Vec<u8>),
    Status(u16, &'static str),
}

impl RecordingService {
    pub fn replying(reply: Reply) -> Self {
        Self {
            submissions: Mutex::new(Vec::new()),
            reply: Mutex::new(reply),
        }
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    pub fn last(&self) -> Submission {
        self.submissions.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl ImageService for RecordingService {
    async fn submit(&self, submission: &Submission) -> Result<GeneratedImage> {
        self.submissions.lock().unwrap().push(submission.clone());
        match &*self.reply.lock().unwrap() {
            Reply::Image(data) => Ok(GeneratedImage::from_bytes(data.clone())),
            Reply::Status(status, message) => Err(GenFormError::Request {
                status: *status,
                message: (*message).to_string(),
            }),
        }
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
