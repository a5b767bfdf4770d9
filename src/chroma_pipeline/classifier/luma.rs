use crate::chroma_pipeline::frame::Bgra;

use super::OpacityMetric;
use super::color_space::luma;
use super::types::{KeyColor, ThresholdBand};

/// Absolute grayscale luma difference.
#[derive(Debug, Clone, Copy)]
pub struct LumaDistance {
    key: f32,
    thresholds: ThresholdBand,
}

impl LumaDistance {
    pub fn new(key: &KeyColor, thresholds: ThresholdBand) -> Self {
        Self {
            key: key.luma(),
            thresholds,
        }
    }

    pub fn distance(&self, pixel: Bgra) -> f32 {
        (luma(pixel) - self.key).abs()
    }
}

impl OpacityMetric for LumaDistance {
    fn opacity(&self, pixel: Bgra) -> f32 {
        self.thresholds.falloff(self.distance(pixel))
    }
}
