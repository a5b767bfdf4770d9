use crate::chroma_pipeline::frame::Bgra;

use super::OpacityMetric;
use super::types::{Channel, ThresholdBand};

/// Max-channel proximity.
///
/// Not a true color distance: a pixel qualifies when the designated channel is
/// the strongest one (or within `velocity` of it) without also being the
/// weakest. Qualifying pixels are scored by their channel spread `max - min`,
/// and a larger spread means a purer key color.
#[derive(Debug, Clone, Copy)]
pub struct MaxChannelProximity {
    channel: Channel,
    velocity: u8,
    thresholds: ThresholdBand,
}

impl MaxChannelProximity {
    pub fn new(channel: Channel, velocity: u8, thresholds: ThresholdBand) -> Self {
        Self {
            channel,
            velocity,
            thresholds,
        }
    }

    /// Channel spread of a qualifying pixel, `None` when the pixel does not qualify.
    pub fn spread(&self, pixel: Bgra) -> Option<u8> {
        let max = pixel.r.max(pixel.g).max(pixel.b);
        let min = pixel.r.min(pixel.g).min(pixel.b);
        let value = self.channel.value(pixel);

        let near_max = value == max || max - value < self.velocity;
        (value != min && near_max).then(|| max - min)
    }
}

impl OpacityMetric for MaxChannelProximity {
    fn opacity(&self, pixel: Bgra) -> f32 {
        match self.spread(pixel) {
            Some(spread) => self.thresholds.rise(spread as f32),
            None => 0.0,
        }
    }
}
