//! Frame source reading headerless BGRA-32 frames from a byte stream.

use std::io::{ErrorKind, Read};

use tracing::debug;

use crate::chroma_pipeline::common::error::{ChromaKeyError, Result};
use crate::chroma_pipeline::frame::{Frame, BYTES_PER_PIXEL};
use crate::chroma_pipeline::io::source::FrameSource;

/// Reads tightly packed `width * height * 4` byte frames back to back.
///
/// A clean end of input on a frame boundary ends the stream; running out of
/// input part-way through a frame means the source failed.
pub struct RawFrameReader<R> {
    reader: R,
    width: usize,
    height: usize,
    frames_read: u64,
}

impl<R: Read + Send> RawFrameReader<R> {
    pub fn new(reader: R, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ChromaKeyError::MalformedFrame(format!(
                "raw source needs a non-empty frame size, got {}x{}",
                width, height
            )));
        }
        Ok(Self {
            reader,
            width,
            height,
            frames_read: 0,
        })
    }

    fn frame_len(&self) -> usize {
        self.width * self.height * BYTES_PER_PIXEL
    }

    /// Fills `buf` completely, returning how many bytes arrived before end of input.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ChromaKeyError::SourceUnavailable(e.to_string())),
            }
        }
        Ok(filled)
    }
}

impl<R: Read + Send> FrameSource for RawFrameReader<R> {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let len = self.frame_len();
        let mut data = vec![0u8; len];
        let filled = self.fill(&mut data)?;

        if filled == 0 {
            debug!(frames = self.frames_read, "Raw source reached end of input");
            return Ok(None);
        }
        if filled < len {
            return Err(ChromaKeyError::SourceUnavailable(format!(
                "truncated frame: got {} of {} bytes",
                filled, len
            )));
        }

        self.frames_read += 1;
        Ok(Some(Frame {
            width: self.width,
            height: self.height,
            stride: (self.width * BYTES_PER_PIXEL) as isize,
            data,
            sequence: 0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_frames_until_clean_end() {
        let bytes: Vec<u8> = (0..2 * 2 * 4 * 2).map(|i| i as u8).collect();
        let mut source = RawFrameReader::new(Cursor::new(bytes), 2, 2).unwrap();

        let first = source.read_frame().unwrap().unwrap();
        assert_eq!(first.data[0], 0);
        assert!(first.validate().is_ok());
        let second = source.read_frame().unwrap().unwrap();
        assert_eq!(second.data[0], 16);
        assert!(source.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_truncated_frame_is_a_source_failure() {
        let mut source = RawFrameReader::new(Cursor::new(vec![0u8; 20]), 2, 2).unwrap();
        assert!(source.read_frame().unwrap().is_some());
        assert!(matches!(
            source.read_frame(),
            Err(ChromaKeyError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn test_empty_geometry_is_rejected() {
        assert!(RawFrameReader::new(Cursor::new(Vec::new()), 0, 2).is_err());
    }
}
