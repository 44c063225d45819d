//! Async controller that drives [`FormState`] against an [`ImageService`].

use crate::error::{GenFormError, Result};
use crate::form::state::{FormState, SlotId, MAX_IMAGES};
use crate::image::{
    GeneratedImage, ImageService, OutputQuality, OutputSize, Preview, SourceFile,
};
use std::path::{Path, PathBuf};

/// The upload-and-generate form bound to a service.
pub struct FormController<S> {
    state: FormState,
    service: S,
}

impl<S: ImageService> FormController<S> {
    /// Creates a controller with an empty form.
    pub fn new(service: S) -> Self {
        Self {
            state: FormState::new(),
            service,
        }
    }

    /// Current form state, for rendering.
    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// The service submissions are sent to.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Decodes `file` and stores it at `index`.
    ///
    /// A file that does not decode as an image is reported through the
    /// form's error field and returned as [`GenFormError::Decode`]. The slots
    /// are left as they were; the previous result is discarded either way.
    pub async fn select_image(&mut self, index: usize, file: SourceFile) -> Result<SlotId> {
        let len = self.state.image_count();
        if index >= MAX_IMAGES || index > len {
            return Err(GenFormError::SlotOutOfRange {
                index,
                len,
                max: MAX_IMAGES,
            });
        }

        let decoded = tokio::task::spawn_blocking(move || {
            Preview::decode(&file).map(|preview| (file, preview))
        })
        .await
        .map_err(|e| GenFormError::Decode(e.to_string()))
        .and_then(|decoded| decoded);

        match decoded {
            Ok((file, preview)) => {
                tracing::debug!(
                    index,
                    name = %file.name,
                    width = preview.width,
                    height = preview.height,
                    "image selected"
                );
                self.state.apply_select_image(index, file, preview)
            }
            Err(e) => {
                tracing::warn!(index, "could not decode image: {e}");
                self.state.apply_decode_failure(&e);
                Err(e)
            }
        }
    }

    /// Reads `path` from disk and selects it into `index`.
    pub async fn select_image_path(
        &mut self,
        index: usize,
        path: impl AsRef<Path>,
    ) -> Result<SlotId> {
        let file = SourceFile::open(path).await?;
        self.select_image(index, file).await
    }

    /// Removes the image at `index`. Returns false if there was none.
    pub fn remove_image(&mut self, index: usize) -> bool {
        self.state.apply_remove_image(index).is_some()
    }

    /// Replaces the prompt.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.state.set_prompt(prompt);
    }

    /// Selects an output size.
    pub fn set_size(&mut self, size: OutputSize) {
        self.state.set_size(size);
    }

    /// Selects an output quality.
    pub fn set_quality(&mut self, quality: OutputQuality) {
        self.state.set_quality(quality);
    }

    /// Submits the form.
    ///
    /// Returns `Ok(None)` when a submission is already in flight. Every
    /// other call produces exactly one outcome, recorded in the state and
    /// also returned here.
    pub async fn submit(&mut self) -> Result<Option<&GeneratedImage>> {
        let Some(submission) = self.state.apply_submit_start()? else {
            tracing::debug!("submission already in flight");
            return Ok(None);
        };

        match self.service.submit(&submission).await {
            Ok(image) => {
                tracing::debug!(id = %image.id, bytes = image.size(), "generated image received");
                self.state.apply_submit_success(image);
                Ok(self.state.result())
            }
            Err(e) => {
                tracing::warn!(route = %submission.route(), "submission failed: {e}");
                self.state.apply_submit_failure(&e);
                Err(e)
            }
        }
    }

    /// Writes the current result to `target`.
    ///
    /// A directory target gets the fixed download file name. Returns the
    /// path written.
    pub async fn save_result(&self, target: impl AsRef<Path>) -> Result<PathBuf> {
        let image = self
            .state
            .result()
            .ok_or_else(|| GenFormError::Validation("No generated image to save".into()))?;

        let target = target.as_ref();
        let is_dir = tokio::fs::metadata(target)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        let path = if is_dir {
            target.join(GeneratedImage::DOWNLOAD_FILE_NAME)
        } else {
            target.to_path_buf()
        };

        image.save(&path).await?;
        Ok(path)
    }
}
