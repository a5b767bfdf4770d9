//! Color space conversions used by the distance metrics

use crate::chroma_pipeline::frame::Bgra;

/// BT.601 luma/chroma triple.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct YCbCr {
    pub y: f32,
    pub cb: f32,
    pub cr: f32,
}

impl YCbCr {
    pub fn from_pixel(pixel: Bgra) -> Self {
        let (r, g, b) = (pixel.r as f32, pixel.g as f32, pixel.b as f32);
        Self {
            y: 0.299 * r + 0.587 * g + 0.114 * b,
            cb: 128.0 - 0.168736 * r - 0.331264 * g + 0.5 * b,
            cr: 128.0 + 0.5 * r - 0.418688 * g - 0.081312 * b,
        }
    }

    /// Euclidean distance in the Cb/Cr plane.
    pub fn chroma_distance(&self, other: &YCbCr) -> f32 {
        let dcb = self.cb - other.cb;
        let dcr = self.cr - other.cr;
        (dcb * dcb + dcr * dcr).sqrt()
    }
}

/// Hue in degrees `[0, 360)`, saturation and value in `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl Hsv {
    pub fn from_pixel(pixel: Bgra) -> Self {
        let (r, g, b) = (pixel.r as f32, pixel.g as f32, pixel.b as f32);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let h = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        let s = if max == 0.0 { 0.0 } else { delta / max * 255.0 };

        Self { h, s, v: max }
    }

    /// Shortest angular distance between two hues, in degrees `[0, 180]`.
    pub fn hue_delta(&self, other: &Hsv) -> f32 {
        let d = (self.h - other.h).abs();
        d.min(360.0 - d)
    }
}

/// Grayscale luma with the weights `0.11 B + 0.59 G + 0.30 R`.
#[inline]
pub fn luma(pixel: Bgra) -> f32 {
    0.11 * pixel.b as f32 + 0.59 * pixel.g as f32 + 0.30 * pixel.r as f32
}
