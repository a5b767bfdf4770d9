//! Frame data module
//!
//! Pixel and frame buffer types, plus the single-slot handoff used between
//! the capture and processing sides of the pipeline.

pub mod types;
mod slot;

pub use types::{Bgra, Frame, BYTES_PER_PIXEL};
pub use slot::FrameSlot;
