use crate::chroma_pipeline::common::error::Result;
use crate::chroma_pipeline::frame::Frame;

/// Delivers packed BGRA-32 frames with a fixed size for the whole session.
pub trait FrameSource: Send {
    /// Blocks until the next frame is available. `Ok(None)` ends the stream.
    fn read_frame(&mut self) -> Result<Option<Frame>>;
}
