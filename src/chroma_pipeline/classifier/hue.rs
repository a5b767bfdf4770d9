use crate::chroma_pipeline::frame::Bgra;

use super::OpacityMetric;
use super::color_space::Hsv;
use super::types::{HsvMode, KeyColor, ThresholdBand};

/// HSV hue distance, optionally combined with saturation and value.
#[derive(Debug, Clone, Copy)]
pub struct HueDistance {
    key: Hsv,
    mode: HsvMode,
    thresholds: ThresholdBand,
}

impl HueDistance {
    pub fn new(key: &KeyColor, mode: HsvMode, thresholds: ThresholdBand) -> Self {
        Self {
            key: key.hsv(),
            mode,
            thresholds,
        }
    }

    /// Distance as a fraction of full scale; `Full` mode can reach `sqrt(3)`.
    pub fn normalized_distance(&self, pixel: Bgra) -> f32 {
        let hsv = Hsv::from_pixel(pixel);
        let dh = hsv.hue_delta(&self.key) / 180.0;
        match self.mode {
            HsvMode::Semifull => dh,
            HsvMode::Full => {
                let ds = (hsv.s - self.key.s) / 255.0;
                let dv = (hsv.v - self.key.v) / 255.0;
                (dh * dh + ds * ds + dv * dv).sqrt()
            }
        }
    }

    pub fn distance(&self, pixel: Bgra) -> f32 {
        self.normalized_distance(pixel) * 255.0
    }
}

impl OpacityMetric for HueDistance {
    fn opacity(&self, pixel: Bgra) -> f32 {
        self.thresholds.falloff(self.distance(pixel))
    }
}
