use crate::chroma_pipeline::frame::Bgra;

use super::OpacityMetric;
use super::types::{KeyColor, ThresholdBand};

/// Largest possible distance between two RGB colors, rounded.
const MAX_RGB_DISTANCE: f32 = 441.0;

/// Euclidean distance in full RGB space, scaled to 0..=255 threshold units.
#[derive(Debug, Clone, Copy)]
pub struct RgbDistance {
    key: Bgra,
    thresholds: ThresholdBand,
}

impl RgbDistance {
    pub fn new(key: &KeyColor, thresholds: ThresholdBand) -> Self {
        Self {
            key: key.color(),
            thresholds,
        }
    }

    pub fn distance(&self, pixel: Bgra) -> f32 {
        let dr = pixel.r as f32 - self.key.r as f32;
        let dg = pixel.g as f32 - self.key.g as f32;
        let db = pixel.b as f32 - self.key.b as f32;
        (dr * dr + dg * dg + db * db).sqrt() / MAX_RGB_DISTANCE * 255.0
    }
}

impl OpacityMetric for RgbDistance {
    fn opacity(&self, pixel: Bgra) -> f32 {
        self.thresholds.falloff(self.distance(pixel))
    }
}
