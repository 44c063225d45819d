//! The upload-and-generate form: typed state plus an async controller.

mod controller;
mod state;

pub use controller::FormController;
pub use state::{FormState, ImageSlot, Lifecycle, SlotId, MAX_IMAGES};
