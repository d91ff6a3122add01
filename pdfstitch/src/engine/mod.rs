//! PDF document engine.
//!
//! Everything that touches PDF objects lives here:
//! - [`slots`]: ordered page slots with reservations
//! - [`image`]: JPEG and PNG decoding into image XObjects
//! - [`pages`]: page copying, inherited attributes and refitting
//! - [`metadata`]: the Info dictionary
//! - [`document`]: the [`OutputDocument`] tying them together

pub mod document;
pub mod image;
pub mod metadata;
pub mod pages;
pub mod slots;

pub use document::OutputDocument;
pub use image::{EmbeddedImage, Placement, PreparedImage};
pub use slots::{Slot, SlotSequence};
