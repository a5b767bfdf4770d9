use std::sync::{Mutex, MutexGuard, PoisonError};

use super::types::Frame;

/// Capacity-1 latest-wins handoff between capture and processing.
///
/// Both `replace` and `take` are a single swap under the lock, so the lock is
/// never held while a frame is transformed or written out.
#[derive(Debug, Default)]
pub struct FrameSlot {
    slot: Mutex<Option<Frame>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Frame>> {
        // A frame is plain data; a panic elsewhere can't leave it half-written.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `frame`, handing back the pending frame it displaced, if any.
    pub fn replace(&self, frame: Frame) -> Option<Frame> {
        self.lock().replace(frame)
    }

    /// Takes the pending frame and leaves the slot empty.
    pub fn take(&self) -> Option<Frame> {
        self.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chroma_pipeline::frame::Bgra;

    #[test]
    fn test_latest_frame_wins() {
        let slot = FrameSlot::new();
        assert!(slot.replace(Frame::filled(1, 1, Bgra::BLACK).with_sequence(1)).is_none());
        let displaced = slot.replace(Frame::filled(1, 1, Bgra::BLACK).with_sequence(2));
        assert_eq!(displaced.map(|f| f.sequence), Some(1));
        slot.replace(Frame::filled(1, 1, Bgra::BLACK).with_sequence(3));

        assert_eq!(slot.take().map(|f| f.sequence), Some(3));
        assert!(slot.take().is_none());
        assert!(slot.is_empty());
    }
}
