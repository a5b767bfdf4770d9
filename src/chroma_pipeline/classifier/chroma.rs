use crate::chroma_pipeline::frame::Bgra;

use super::OpacityMetric;
use super::color_space::YCbCr;
use super::types::{KeyColor, ThresholdBand};

/// Euclidean distance between pixel and key in the BT.601 Cb/Cr plane.
/// Luma is ignored, so shadows on the backdrop stay keyed.
#[derive(Debug, Clone, Copy)]
pub struct ChromaDistance {
    key: YCbCr,
    thresholds: ThresholdBand,
}

impl ChromaDistance {
    pub fn new(key: &KeyColor, thresholds: ThresholdBand) -> Self {
        Self {
            key: key.ycbcr(),
            thresholds,
        }
    }

    pub fn distance(&self, pixel: Bgra) -> f32 {
        YCbCr::from_pixel(pixel).chroma_distance(&self.key)
    }
}

impl OpacityMetric for ChromaDistance {
    fn opacity(&self, pixel: Bgra) -> f32 {
        self.thresholds.falloff(self.distance(pixel))
    }
}
