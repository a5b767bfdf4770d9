//! Turns a pixel's opacity into output pixel values.

use crate::chroma_pipeline::classifier::Metric;
use crate::chroma_pipeline::frame::Bgra;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    /// May recolor B, G and R toward the substitute color.
    FullMask,
    /// Only alpha is scaled; color channels are never touched.
    #[default]
    AlphaOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Compositor {
    mode: CompositeMode,
    substitute: Option<Bgra>,
}

impl Compositor {
    pub fn new(mode: CompositeMode, substitute: Option<Bgra>) -> Self {
        Self { mode, substitute }
    }

    /// Picks the mode from the full-mask flag, unless the metric only works on alpha.
    pub fn for_metric(full_mask: bool, substitute: Option<Bgra>, metric: &Metric) -> Self {
        let mode = if full_mask && !metric.forces_alpha_only() {
            CompositeMode::FullMask
        } else {
            CompositeMode::AlphaOnly
        };
        Self::new(mode, substitute)
    }

    pub fn mode(&self) -> CompositeMode {
        self.mode
    }

    pub fn substitute(&self) -> Option<Bgra> {
        self.substitute
    }

    #[inline]
    pub fn composite(&self, pixel: Bgra, opacity: f32) -> Bgra {
        if opacity <= 0.0 || opacity.is_nan() {
            return pixel;
        }
        let opacity = opacity.min(1.0);

        match (self.mode, self.substitute) {
            (CompositeMode::FullMask, Some(substitute)) => {
                if opacity >= 1.0 {
                    return substitute;
                }
                Bgra {
                    b: blend(substitute.b, pixel.b, opacity),
                    g: blend(substitute.g, pixel.g, opacity),
                    r: blend(substitute.r, pixel.r, opacity),
                    a: blend(substitute.a, pixel.a, opacity),
                }
            }
            _ => Bgra {
                a: to_byte(pixel.a as f32 * (1.0 - opacity)),
                ..pixel
            },
        }
    }
}

#[inline]
fn blend(substitute: u8, original: u8, opacity: f32) -> u8 {
    to_byte(substitute as f32 * opacity + original as f32 * (1.0 - opacity))
}

#[inline]
fn to_byte(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
