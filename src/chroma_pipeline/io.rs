//! Source and sink collaborators
//!
//! This module defines the seams to the outside world (frame sources and
//! sinks), raw-stream implementations of both, and the output stage that
//! composites processed frames over a background and packs them in the
//! sink's pixel format.

mod source;
mod raw_frame_reader;
mod sink;
mod writer_sink;
pub mod output;

pub use source::FrameSource;
pub use raw_frame_reader::RawFrameReader;
pub use sink::{FrameSink, SinkFormat, StreamSpec};
pub use writer_sink::WriterSink;
pub use output::{Background, OutputComposer};
