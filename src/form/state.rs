//! Form state and its pure transitions.
//!
//! Nothing here performs I/O: decoding, networking and rendering live in the
//! controller and its callers, so every transition can be exercised directly.

use crate::error::{GenFormError, Result};
use crate::image::{
    GeneratedImage, OutputQuality, OutputSize, Preview, Route, SourceFile, Submission,
};

/// Maximum number of attached images.
pub const MAX_IMAGES: usize = 4;

const EMPTY_PROMPT_MESSAGE: &str = "Please enter a prompt";
const FAILURE_PREFIX: &str = "Failed to generate image";

/// Stable identifier of a slot entry, assigned when the entry is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

/// One attached image and its decoded preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlot {
    /// Stable key of this entry.
    pub id: SlotId,
    /// The selected file, sent as-is on submit.
    pub file: SourceFile,
    /// Decoded preview shown in the slot.
    pub preview: Preview,
}

/// Submission lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// No request outstanding; submit may be started.
    #[default]
    Idle,
    /// A request is in flight; submit is disabled.
    Submitting,
}

/// Complete state of the upload-and-generate form.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    slots: Vec<ImageSlot>,
    next_slot_id: u64,
    prompt: String,
    size: OutputSize,
    quality: OutputQuality,
    lifecycle: Lifecycle,
    error: Option<String>,
    result: Option<GeneratedImage>,
}

impl FormState {
    /// Creates an empty form with default size and quality.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attached images in slot order.
    pub fn slots(&self) -> &[ImageSlot] {
        &self.slots
    }

    /// The entry at `index`, if any.
    pub fn slot(&self, index: usize) -> Option<&ImageSlot> {
        self.slots.get(index)
    }

    /// Number of attached images.
    pub fn image_count(&self) -> usize {
        self.slots.len()
    }

    /// Prompt as typed.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Selected output size.
    pub fn size(&self) -> OutputSize {
        self.size
    }

    /// Selected output quality.
    pub fn quality(&self) -> OutputQuality {
        self.quality
    }

    /// Current submission lifecycle.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// True while a request is in flight.
    pub fn is_submitting(&self) -> bool {
        self.lifecycle == Lifecycle::Submitting
    }

    /// Message of the last failure, if it has not been cleared.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Image from the last successful submission.
    pub fn result(&self) -> Option<&GeneratedImage> {
        self.result.as_ref()
    }

    /// Route the current attachments would be sent to.
    pub fn route(&self) -> Route {
        Route::for_image_count(self.slots.len())
    }

    /// Stores `file` at `index`, replacing an existing entry or appending at
    /// the end. Any previous result is discarded.
    pub fn apply_select_image(
        &mut self,
        index: usize,
        file: SourceFile,
        preview: Preview,
    ) -> Result<SlotId> {
        let len = self.slots.len();
        if index >= MAX_IMAGES || index > len {
            return Err(GenFormError::SlotOutOfRange {
                index,
                len,
                max: MAX_IMAGES,
            });
        }

        let id = SlotId(self.next_slot_id);
        self.next_slot_id += 1;
        let slot = ImageSlot { id, file, preview };

        if index == len {
            self.slots.push(slot);
        } else {
            self.slots[index] = slot;
        }
        self.result = None;
        Ok(id)
    }

    /// Records a selected file that could not be decoded. The slots are
    /// kept; the previous result is discarded like for any selection.
    pub fn apply_decode_failure(&mut self, err: &GenFormError) {
        self.error = Some(err.to_string());
        self.result = None;
    }

    /// Removes the entry at `index`, shifting later entries down.
    /// Out-of-range indices are a no-op.
    pub fn apply_remove_image(&mut self, index: usize) -> Option<ImageSlot> {
        (index < self.slots.len()).then(|| self.slots.remove(index))
    }

    /// Removes the entry with the given id, wherever it currently sits.
    pub fn remove_slot(&mut self, id: SlotId) -> Option<ImageSlot> {
        let index = self.slots.iter().position(|s| s.id == id)?;
        self.apply_remove_image(index)
    }

    /// Replaces the prompt.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Selects an output size.
    pub fn set_size(&mut self, size: OutputSize) {
        self.size = size;
    }

    /// Selects an output quality.
    pub fn set_quality(&mut self, quality: OutputQuality) {
        self.quality = quality;
    }

    /// Begins a submission.
    ///
    /// Returns `Ok(None)` without touching anything while another submission
    /// is in flight. A blank prompt sets the error field and fails before
    /// any state change.
    pub fn apply_submit_start(&mut self) -> Result<Option<Submission>> {
        if self.is_submitting() {
            return Ok(None);
        }

        if self.prompt.trim().is_empty() {
            self.error = Some(EMPTY_PROMPT_MESSAGE.to_string());
            return Err(GenFormError::Validation(EMPTY_PROMPT_MESSAGE.to_string()));
        }

        self.lifecycle = Lifecycle::Submitting;
        self.error = None;

        Ok(Some(Submission {
            prompt: self.prompt.clone(),
            size: self.size,
            quality: self.quality,
            images: self.slots.iter().map(|s| s.file.clone()).collect(),
        }))
    }

    /// Completes a submission with a new result.
    pub fn apply_submit_success(&mut self, image: GeneratedImage) {
        self.result = Some(image);
        self.error = None;
        self.lifecycle = Lifecycle::Idle;
    }

    /// Completes a submission with an error. The previous result is kept.
    pub fn apply_submit_failure(&mut self, err: &GenFormError) {
        self.error = Some(format!("{FAILURE_PREFIX}: {err}"));
        self.lifecycle = Lifecycle::Idle;
    }

    /// Whether the submit action is enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && !self.prompt.trim().is_empty()
    }

    /// Number of drop/browse slots to show: every filled slot plus one empty
    /// one, up to the maximum.
    pub fn visible_slot_count(&self) -> usize {
        (self.slots.len() + 1).min(MAX_IMAGES)
    }

    /// Count indicator shown under the slots.
    pub fn slot_summary(&self) -> String {
        format!("{} of {} images selected", self.slots.len(), MAX_IMAGES)
    }

    /// Caption of the submit action.
    pub fn submit_label(&self) -> &'static str {
        if self.is_submitting() {
            "Generating..."
        } else {
            "Generate Image"
        }
    }
}
