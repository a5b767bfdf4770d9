use std::str::FromStr;

use crate::chroma_pipeline::common::error::{ConfigurationError, Result};

/// Pixel layout of the raw stream handed to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkFormat {
    /// R, G, B per pixel, row-major, no padding
    #[default]
    Rgb24,
    /// B, G, R, A per pixel, row-major, no padding
    Bgra32,
}

impl SinkFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            SinkFormat::Rgb24 => 3,
            SinkFormat::Bgra32 => 4,
        }
    }
}

impl FromStr for SinkFormat {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rgb24" | "rgb" => Ok(SinkFormat::Rgb24),
            "bgra32" | "bgra" => Ok(SinkFormat::Bgra32),
            other => Err(ConfigurationError::UnknownOutputFormat(other.to_string())),
        }
    }
}

/// Stream parameters agreed with the sink before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub width: usize,
    pub height: usize,
    pub format: SinkFormat,
    pub fps: u32,
}

impl StreamSpec {
    pub fn row_bytes(&self) -> usize {
        self.width * self.format.bytes_per_pixel()
    }

    pub fn frame_bytes(&self) -> usize {
        self.row_bytes() * self.height
    }
}

/// Consumer of the processed raw stream.
pub trait FrameSink: Send {
    /// Called exactly once, before the first frame. The spec holds for the
    /// rest of the session.
    fn negotiate(&mut self, _spec: &StreamSpec) -> Result<()> {
        Ok(())
    }

    /// Writes one packed frame of `spec.frame_bytes()` bytes. May block.
    fn write_frame(&mut self, data: &[u8]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!("RGB24".parse::<SinkFormat>(), Ok(SinkFormat::Rgb24));
        assert_eq!(" bgra ".parse::<SinkFormat>(), Ok(SinkFormat::Bgra32));
        assert_eq!(
            "yuv420".parse::<SinkFormat>(),
            Err(ConfigurationError::UnknownOutputFormat("yuv420".to_string()))
        );
    }
}
