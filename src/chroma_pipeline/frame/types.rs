//! Types for frame buffers

use std::fmt;
use std::str::FromStr;

use crate::chroma_pipeline::common::error::{ChromaKeyError, ConfigurationError, Result};

/// Bytes per packed BGRA-32 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// A single pixel in B, G, R, A byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bgra {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Bgra {
    pub const GREEN: Bgra = Bgra::rgb(0, 255, 0);
    pub const BLACK: Bgra = Bgra::rgb(0, 0, 0);

    pub const fn new(b: u8, g: u8, r: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    /// Opaque color from red, green and blue components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { b, g, r, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    /// Reads a pixel from the first four bytes of `bytes`.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            b: bytes[0],
            g: bytes[1],
            r: bytes[2],
            a: bytes[3],
        }
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 4] {
        [self.b, self.g, self.r, self.a]
    }
}

impl fmt::Display for Bgra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}

/// Parses `#RRGGBB`, `#RRGGBBAA`, `r,g,b` or `r,g,b,a`.
impl FromStr for Bgra {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || ConfigurationError::InvalidColor(s.to_string());
        let text = s.trim();

        if let Some(hex) = text.strip_prefix('#') {
            if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
                return Err(invalid());
            }
            let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
            let alpha = if hex.len() == 8 { byte(6)? } else { 255 };
            return Ok(Bgra::rgba(byte(0)?, byte(2)?, byte(4)?, alpha));
        }

        let parts = text
            .split(',')
            .map(|p| p.trim().parse::<u8>().map_err(|_| invalid()))
            .collect::<std::result::Result<Vec<u8>, _>>()?;
        match parts.as_slice() {
            [r, g, b] => Ok(Bgra::rgb(*r, *g, *b)),
            [r, g, b, a] => Ok(Bgra::rgba(*r, *g, *b, *a)),
            _ => Err(invalid()),
        }
    }
}

/// A packed BGRA-32 frame.
///
/// `stride` is the declared row pitch in bytes and may be negative for
/// bottom-up layouts; all offset arithmetic uses its absolute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width of the frame in pixels
    pub width: usize,
    /// Height of the frame in pixels
    pub height: usize,
    /// Declared bytes per row, possibly negative
    pub stride: isize,
    /// Pixel bytes, `|stride| * height` long
    pub data: Vec<u8>,
    /// Capture order, assigned by the pipeline
    pub sequence: u64,
}

impl Frame {
    /// Creates a tightly packed frame filled with `color`.
    pub fn filled(width: usize, height: usize, color: Bgra) -> Self {
        let data = color.to_bytes().repeat(width * height);
        Self {
            width,
            height,
            stride: (width * BYTES_PER_PIXEL) as isize,
            data,
            sequence: 0,
        }
    }

    /// Creates a tightly packed frame from row-major pixels.
    pub fn from_pixels(width: usize, height: usize, pixels: &[Bgra]) -> Result<Self> {
        if pixels.len() != width * height {
            return Err(ChromaKeyError::MalformedFrame(format!(
                "expected {} pixels for {}x{}, got {}",
                width * height,
                width,
                height,
                pixels.len()
            )));
        }
        let data = pixels.iter().flat_map(|p| p.to_bytes()).collect();
        Ok(Self {
            width,
            height,
            stride: (width * BYTES_PER_PIXEL) as isize,
            data,
            sequence: 0,
        })
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Absolute row pitch in bytes.
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.stride.unsigned_abs()
    }

    /// Bytes of actual pixel data in each row, excluding alignment padding.
    #[inline]
    pub fn pixel_row_bytes(&self) -> usize {
        self.width * BYTES_PER_PIXEL
    }

    /// Checks that the declared geometry agrees with the buffer.
    pub fn validate(&self) -> Result<()> {
        let row_bytes = self.row_bytes();
        if self.width == 0 || self.height == 0 {
            return Err(ChromaKeyError::MalformedFrame(format!(
                "empty frame {}x{}",
                self.width, self.height
            )));
        }
        if row_bytes < self.pixel_row_bytes() {
            return Err(ChromaKeyError::MalformedFrame(format!(
                "stride {} is shorter than {} pixels",
                self.stride, self.width
            )));
        }
        let expected = row_bytes.checked_mul(self.height).ok_or_else(|| {
            ChromaKeyError::MalformedFrame(format!(
                "stride {} x height {} overflows",
                self.stride, self.height
            ))
        })?;
        if self.data.len() != expected {
            return Err(ChromaKeyError::MalformedFrame(format!(
                "{}x{} with stride {} needs {} bytes, buffer has {}",
                self.width,
                self.height,
                self.stride,
                expected,
                self.data.len()
            )));
        }
        Ok(())
    }

    /// Byte offset of pixel `(x, y)`, or `None` when outside the frame or buffer.
    #[inline]
    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y * self.row_bytes() + x * BYTES_PER_PIXEL;
        (offset + BYTES_PER_PIXEL <= self.data.len()).then_some(offset)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Bgra> {
        self.offset(x, y)
            .map(|o| Bgra::from_bytes(&self.data[o..o + BYTES_PER_PIXEL]))
    }

    /// Writes `pixel` at `(x, y)`; returns false when the coordinate is out of bounds.
    pub fn set_pixel(&mut self, x: usize, y: usize, pixel: Bgra) -> bool {
        match self.offset(x, y) {
            Some(o) => {
                self.data[o..o + BYTES_PER_PIXEL].copy_from_slice(&pixel.to_bytes());
                true
            }
            None => false,
        }
    }

    /// Pixel bytes of row `y` without stride padding.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.row_bytes();
        self.data.get(start..start + self.pixel_row_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parsing() {
        assert_eq!("#00FF00".parse::<Bgra>().unwrap(), Bgra::GREEN);
        assert_eq!("#ff00ff80".parse::<Bgra>().unwrap(), Bgra::rgba(255, 0, 255, 128));
        assert_eq!(" 1, 2, 3 ".parse::<Bgra>().unwrap(), Bgra::rgb(1, 2, 3));
        assert_eq!("1,2,3,4".parse::<Bgra>().unwrap(), Bgra::rgba(1, 2, 3, 4));
        assert!("#12345".parse::<Bgra>().is_err());
        assert!("1,2".parse::<Bgra>().is_err());
        assert!("300,0,0".parse::<Bgra>().is_err());
    }

    #[test]
    fn test_validate_padded_stride() {
        let frame = Frame {
            width: 3,
            height: 2,
            stride: 16,
            data: vec![0u8; 32],
            sequence: 0,
        };
        assert!(frame.validate().is_ok());
        assert_eq!(frame.row(1).unwrap().len(), 12);
    }

    #[test]
    fn test_validate_negative_stride_uses_absolute_value() {
        let frame = Frame {
            width: 2,
            height: 2,
            stride: -8,
            data: vec![0u8; 16],
            sequence: 0,
        };
        assert!(frame.validate().is_ok());
        assert_eq!(frame.row_bytes(), 8);
    }

    #[test]
    fn test_validate_rejects_short_buffer() {
        let frame = Frame {
            width: 4,
            height: 4,
            stride: 16,
            data: vec![0u8; 60],
            sequence: 0,
        };
        assert!(matches!(frame.validate(), Err(ChromaKeyError::MalformedFrame(_))));
    }

    #[test]
    fn test_validate_rejects_narrow_stride() {
        let frame = Frame {
            width: 4,
            height: 1,
            stride: 12,
            data: vec![0u8; 12],
            sequence: 0,
        };
        assert!(matches!(frame.validate(), Err(ChromaKeyError::MalformedFrame(_))));
    }

    #[test]
    fn test_pixel_accessor_is_bounds_checked() {
        let mut frame = Frame::filled(2, 2, Bgra::BLACK);
        assert!(frame.set_pixel(1, 1, Bgra::GREEN));
        assert_eq!(frame.pixel(1, 1), Some(Bgra::GREEN));
        assert_eq!(frame.pixel(2, 0), None);
        assert!(!frame.set_pixel(0, 2, Bgra::GREEN));
    }
}
