//! Output stage: composites processed frames over a background and packs
//! them into the sink's pixel format.

use rayon::prelude::*;
use tracing::debug;

use crate::chroma_pipeline::common::error::{ChromaKeyError, Result};
use crate::chroma_pipeline::frame::{Bgra, Frame, BYTES_PER_PIXEL};
use crate::chroma_pipeline::io::sink::SinkFormat;

/// What shows through where the foreground is transparent.
///
/// Backgrounds are treated as opaque.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Background {
    /// Opaque black under RGB24 output; BGRA32 output keeps its alpha
    #[default]
    None,
    Color(Bgra),
    /// Resampled to the stream resolution if its size differs
    Image(Frame),
}

pub struct OutputComposer {
    format: SinkFormat,
    background: Background,
    resolved: Option<Frame>,
    size: Option<(usize, usize)>,
}

impl OutputComposer {
    pub fn new(format: SinkFormat, background: Background) -> Self {
        Self {
            format,
            background,
            resolved: None,
            size: None,
        }
    }

    pub fn format(&self) -> SinkFormat {
        self.format
    }

    /// Fixes the stream resolution and prepares the background for it.
    pub fn prepare(&mut self, width: usize, height: usize) -> Result<()> {
        self.resolved = match &self.background {
            Background::Image(image) => {
                image.validate()?;
                if image.width == width && image.height == height {
                    Some(image.clone())
                } else {
                    debug!(
                        from_width = image.width,
                        from_height = image.height,
                        width,
                        height,
                        "Resampling background image"
                    );
                    Some(resample_nearest(image, width, height)?)
                }
            }
            _ => None,
        };
        self.size = Some((width, height));
        Ok(())
    }

    /// Packs `frame` for the sink. The frame must match the prepared size.
    pub fn compose(&self, frame: &Frame) -> Result<Vec<u8>> {
        frame.validate()?;
        let (width, height) = self.size.unwrap_or((frame.width, frame.height));
        if (frame.width, frame.height) != (width, height) {
            return Err(ChromaKeyError::MalformedFrame(format!(
                "frame is {}x{} but the stream is {}x{}",
                frame.width, frame.height, width, height
            )));
        }

        let out_bpp = self.format.bytes_per_pixel();
        let out_row = width * out_bpp;
        let mut out = vec![0u8; out_row * height];

        out.par_chunks_mut(out_row)
            .enumerate()
            .try_for_each(|(y, out_row)| -> Result<()> {
                let src = frame.row(y).ok_or_else(|| {
                    ChromaKeyError::MalformedFrame(format!("missing row {}", y))
                })?;
                let bg_row = self.resolved.as_ref().and_then(|bg| bg.row(y));
                for (x, (src, dst)) in src
                    .chunks_exact(BYTES_PER_PIXEL)
                    .zip(out_row.chunks_exact_mut(out_bpp))
                    .enumerate()
                {
                    let fg = Bgra::from_bytes(src);
                    let pixel = match (&self.background, bg_row) {
                        (Background::Color(bg), _) => over(fg, *bg),
                        (Background::Image(_), Some(row)) => {
                            let o = x * BYTES_PER_PIXEL;
                            over(fg, Bgra::from_bytes(&row[o..o + BYTES_PER_PIXEL]))
                        }
                        (Background::None, _) if self.format == SinkFormat::Rgb24 => {
                            over(fg, Bgra::BLACK)
                        }
                        _ => fg,
                    };
                    write_pixel(self.format, pixel, dst);
                }
                Ok(())
            })?;

        Ok(out)
    }
}

/// Foreground over an opaque background.
#[inline]
fn over(fg: Bgra, bg: Bgra) -> Bgra {
    if fg.a == 255 {
        return Bgra { a: 255, ..fg };
    }
    let a = fg.a as f32 / 255.0;
    let mix = |f: u8, b: u8| (f as f32 * a + b as f32 * (1.0 - a)).round().clamp(0.0, 255.0) as u8;
    Bgra {
        b: mix(fg.b, bg.b),
        g: mix(fg.g, bg.g),
        r: mix(fg.r, bg.r),
        a: 255,
    }
}

#[inline]
fn write_pixel(format: SinkFormat, pixel: Bgra, dst: &mut [u8]) {
    match format {
        SinkFormat::Rgb24 => {
            dst[0] = pixel.r;
            dst[1] = pixel.g;
            dst[2] = pixel.b;
        }
        SinkFormat::Bgra32 => dst.copy_from_slice(&pixel.to_bytes()),
    }
}

fn resample_nearest(image: &Frame, width: usize, height: usize) -> Result<Frame> {
    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        let sy = y * image.height / height;
        for x in 0..width {
            let sx = x * image.width / width;
            let pixel = image.pixel(sx, sy).ok_or_else(|| {
                ChromaKeyError::MalformedFrame(format!("background pixel {},{} out of range", sx, sy))
            })?;
            pixels.push(pixel);
        }
    }
    Frame::from_pixels(width, height, &pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb24_without_background_drops_padding() {
        let mut frame = Frame {
            width: 2,
            height: 1,
            stride: 12,
            data: vec![1, 2, 3, 255, 4, 5, 6, 255, 9, 9, 9, 9],
            sequence: 0,
        };
        frame.validate().unwrap();

        let mut composer = OutputComposer::new(SinkFormat::Rgb24, Background::None);
        composer.prepare(2, 1).unwrap();
        assert_eq!(composer.compose(&frame).unwrap(), vec![3, 2, 1, 6, 5, 4]);

        frame.stride = -12;
        assert_eq!(composer.compose(&frame).unwrap(), vec![3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn test_rgb24_without_background_uses_black() {
        let frame = Frame::from_pixels(
            3,
            1,
            &[
                Bgra::rgba(0, 255, 0, 0),
                Bgra::rgba(200, 100, 50, 255),
                Bgra::rgba(0, 255, 0, 128),
            ],
        )
        .unwrap();

        let mut composer = OutputComposer::new(SinkFormat::Rgb24, Background::None);
        composer.prepare(3, 1).unwrap();
        assert_eq!(composer.compose(&frame).unwrap(), vec![0, 0, 0, 200, 100, 50, 0, 128, 0]);

        let mut composer = OutputComposer::new(SinkFormat::Bgra32, Background::None);
        composer.prepare(3, 1).unwrap();
        let out = composer.compose(&frame).unwrap();
        assert_eq!(&out[0..4], &[0, 255, 0, 0]);
        assert_eq!(&out[8..12], &[0, 255, 0, 128]);
    }

    #[test]
    fn test_color_background_shows_through_transparency() {
        let frame = Frame::from_pixels(
            3,
            1,
            &[
                Bgra::rgba(0, 255, 0, 0),
                Bgra::rgba(200, 100, 50, 255),
                Bgra::rgba(0, 0, 0, 128),
            ],
        )
        .unwrap();
        let mut composer =
            OutputComposer::new(SinkFormat::Rgb24, Background::Color(Bgra::rgb(255, 0, 255)));
        composer.prepare(3, 1).unwrap();

        let out = composer.compose(&frame).unwrap();
        assert_eq!(&out[0..3], &[255, 0, 255]);
        assert_eq!(&out[3..6], &[200, 100, 50]);
        assert_eq!(&out[6..9], &[127, 0, 127]);
    }

    #[test]
    fn test_image_background_is_resampled() {
        let background = Frame::from_pixels(
            2,
            1,
            &[Bgra::rgb(10, 10, 10), Bgra::rgb(20, 20, 20)],
        )
        .unwrap();
        let frame = Frame::filled(4, 2, Bgra::rgba(0, 0, 0, 0));
        let mut composer = OutputComposer::new(SinkFormat::Bgra32, Background::Image(background));
        composer.prepare(4, 2).unwrap();

        let out = composer.compose(&frame).unwrap();
        let reds: Vec<u8> = out.chunks_exact(4).map(|p| p[2]).collect();
        assert_eq!(reds, vec![10, 10, 20, 20, 10, 10, 20, 20]);
        assert!(out.chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn test_size_change_is_rejected() {
        let mut composer = OutputComposer::new(SinkFormat::Rgb24, Background::None);
        composer.prepare(2, 2).unwrap();
        let result = composer.compose(&Frame::filled(3, 2, Bgra::BLACK));
        assert!(matches!(result, Err(ChromaKeyError::MalformedFrame(_))));
    }
}
