//! Chroma-key classification
//!
//! Every metric maps a pixel to an opacity in `[0, 1]`: 1.0 is fully
//! background (to be removed or replaced), 0.0 is fully foreground.
//! The concrete metric is chosen once from a [`ClassifierConfig`] and then
//! evaluated per pixel without further branching on configuration.

mod chroma;
pub mod color_space;
mod hue;
mod luma;
mod max_channel;
mod redmean;
mod rgb;
pub mod types;


use crate::chroma_pipeline::frame::Bgra;

pub use chroma::ChromaDistance;
pub use hue::HueDistance;
pub use luma::LumaDistance;
pub use max_channel::MaxChannelProximity;
pub use redmean::RedmeanDistance;
pub use rgb::RgbDistance;
pub use types::{
    Channel, ClassifierConfig, HsvMode, KeyColor, MaxChannelVariant, Metric, ThresholdBand,
};

/// A pure pixel-to-opacity function.
pub trait OpacityMetric: Send + Sync {
    fn opacity(&self, pixel: Bgra) -> f32;
}

/// The metric selected by configuration.
#[derive(Debug, Clone, Copy)]
pub enum Classifier {
    MaxChannel(MaxChannelProximity),
    Chroma(ChromaDistance),
    Rgb(RgbDistance),
    Luma(LumaDistance),
    Redmean(RedmeanDistance),
    Hue(HueDistance),
}

impl Classifier {
    pub fn from_config(config: &ClassifierConfig) -> Self {
        let key = &config.key_color;
        let thresholds = config.thresholds;
        match config.metric {
            Metric::MaxChannel { channel, velocity, .. } => {
                Classifier::MaxChannel(MaxChannelProximity::new(channel, velocity, thresholds))
            }
            Metric::YCbCr => Classifier::Chroma(ChromaDistance::new(key, thresholds)),
            Metric::Rgb => Classifier::Rgb(RgbDistance::new(key, thresholds)),
            Metric::Luma => Classifier::Luma(LumaDistance::new(key, thresholds)),
            Metric::Redmean => Classifier::Redmean(RedmeanDistance::new(key, thresholds)),
            Metric::Hsv { mode } => Classifier::Hue(HueDistance::new(key, mode, thresholds)),
        }
    }
}

impl OpacityMetric for Classifier {
    #[inline]
    fn opacity(&self, pixel: Bgra) -> f32 {
        match self {
            Classifier::MaxChannel(m) => m.opacity(pixel),
            Classifier::Chroma(m) => m.opacity(pixel),
            Classifier::Rgb(m) => m.opacity(pixel),
            Classifier::Luma(m) => m.opacity(pixel),
            Classifier::Redmean(m) => m.opacity(pixel),
            Classifier::Hue(m) => m.opacity(pixel),
        }
    }
}
