use crate::chroma_pipeline::frame::Bgra;

use super::OpacityMetric;
use super::types::{KeyColor, ThresholdBand};

/// Approximate upper bound of the redmean distance.
const MAX_REDMEAN_DISTANCE: f32 = 767.0;

/// "Redmean" weighted RGB distance, a cheap perceptual approximation.
///
/// Evaluated in `i64` so the weighted squared terms can't overflow.
#[derive(Debug, Clone, Copy)]
pub struct RedmeanDistance {
    key: Bgra,
    thresholds: ThresholdBand,
}

impl RedmeanDistance {
    pub fn new(key: &KeyColor, thresholds: ThresholdBand) -> Self {
        Self {
            key: key.color(),
            thresholds,
        }
    }

    /// Raw redmean distance, roughly `0..=767`.
    pub fn raw_distance(&self, pixel: Bgra) -> f32 {
        let rmean = (pixel.r as i64 + self.key.r as i64) / 2;
        let dr = pixel.r as i64 - self.key.r as i64;
        let dg = pixel.g as i64 - self.key.g as i64;
        let db = pixel.b as i64 - self.key.b as i64;

        let weighted =
            (((512 + rmean) * dr * dr) >> 8) + 4 * dg * dg + (((767 - rmean) * db * db) >> 8);
        (weighted as f64).sqrt() as f32
    }

    pub fn distance(&self, pixel: Bgra) -> f32 {
        self.raw_distance(pixel) / MAX_REDMEAN_DISTANCE * 255.0
    }
}

impl OpacityMetric for RedmeanDistance {
    fn opacity(&self, pixel: Bgra) -> f32 {
        self.thresholds.falloff(self.distance(pixel))
    }
}
