//! Configuration types for the classifier family

use std::str::FromStr;

use crate::chroma_pipeline::common::error::ConfigurationError;
use crate::chroma_pipeline::frame::Bgra;

use super::color_space::{luma, Hsv, YCbCr};

/// Designated channel for the max-channel proximity metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channel {
    Red,
    #[default]
    Green,
    Blue,
}

impl Channel {
    #[inline]
    pub fn value(self, pixel: Bgra) -> u8 {
        match self {
            Channel::Red => pixel.r,
            Channel::Green => pixel.g,
            Channel::Blue => pixel.b,
        }
    }
}

impl FromStr for Channel {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" | "r" => Ok(Channel::Red),
            "green" | "g" => Ok(Channel::Green),
            "blue" | "b" => Ok(Channel::Blue),
            other => Err(ConfigurationError::UnknownChannel(other.to_string())),
        }
    }
}

/// How much of the HSV representation takes part in the distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HsvMode {
    /// Hue only
    #[default]
    Semifull,
    /// Hue, saturation and value
    Full,
}

impl FromStr for HsvMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "semifull" => Ok(HsvMode::Semifull),
            "full" => Ok(HsvMode::Full),
            other => Err(ConfigurationError::UnknownHsvMode(other.to_string())),
        }
    }
}

/// The two historical forms of the max-channel metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxChannelVariant {
    /// Opacity drives a blend toward the substitute color
    #[default]
    Recolor,
    /// Opacity scales the alpha channel only, whatever the compositing mode
    AlphaOnly,
}

/// Classifier selection with its metric-specific parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    MaxChannel {
        channel: Channel,
        velocity: u8,
        variant: MaxChannelVariant,
    },
    YCbCr,
    Rgb,
    Luma,
    Redmean,
    Hsv { mode: HsvMode },
}

impl Default for Metric {
    fn default() -> Self {
        Metric::MaxChannel {
            channel: Channel::Green,
            velocity: 8,
            variant: MaxChannelVariant::Recolor,
        }
    }
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::MaxChannel { variant: MaxChannelVariant::Recolor, .. } => "max-channel",
            Metric::MaxChannel { variant: MaxChannelVariant::AlphaOnly, .. } => "max-channel-alpha",
            Metric::YCbCr => "ycbcr",
            Metric::Rgb => "rgb",
            Metric::Luma => "luma",
            Metric::Redmean => "redmean",
            Metric::Hsv { mode: HsvMode::Semifull } => "hsv",
            Metric::Hsv { mode: HsvMode::Full } => "hsv-full",
        }
    }

    /// True when the metric only ever touches the alpha channel.
    pub fn forces_alpha_only(&self) -> bool {
        matches!(
            self,
            Metric::MaxChannel { variant: MaxChannelVariant::AlphaOnly, .. }
        )
    }
}

impl FromStr for Metric {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let metric = match s.trim().to_ascii_lowercase().as_str() {
            "max-channel" | "maxchannel" => Metric::default(),
            "max-channel-alpha" | "maxchannel-alpha" => Metric::MaxChannel {
                channel: Channel::Green,
                velocity: 8,
                variant: MaxChannelVariant::AlphaOnly,
            },
            "ycbcr" => Metric::YCbCr,
            "rgb" => Metric::Rgb,
            "luma" | "grayscale" => Metric::Luma,
            "redmean" => Metric::Redmean,
            "hsv" | "hsv-semifull" => Metric::Hsv { mode: HsvMode::Semifull },
            "hsv-full" => Metric::Hsv { mode: HsvMode::Full },
            other => return Err(ConfigurationError::UnknownClassifier(other.to_string())),
        };
        Ok(metric)
    }
}

/// Threshold band in 0..=255 metric units.
///
/// `Off` has no interpolation band: a hard cut at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdBand {
    Off { max: u8 },
    Band { min: u8, mid: Option<u8>, max: u8 },
}

impl Default for ThresholdBand {
    fn default() -> Self {
        ThresholdBand::Off { max: 96 }
    }
}

impl ThresholdBand {
    /// Builds a band, rejecting `min > max` and a `mid` outside `[min, max]`.
    ///
    /// A `mid` without a `min` starts the band at zero.
    pub fn new(min: Option<u8>, mid: Option<u8>, max: u8) -> Result<Self, ConfigurationError> {
        let band = match (min, mid) {
            (None, None) => ThresholdBand::Off { max },
            (min, mid) => ThresholdBand::Band {
                min: min.unwrap_or(0),
                mid,
                max,
            },
        };
        band.validate()?;
        Ok(band)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            ThresholdBand::Off { .. } => Ok(()),
            ThresholdBand::Band { min, mid, max } => {
                let ordered = min <= max && mid.is_none_or(|mid| min <= mid && mid <= max);
                if ordered {
                    Ok(())
                } else {
                    Err(ConfigurationError::InvalidThresholds {
                        min: Some(min),
                        mid,
                        max,
                    })
                }
            }
        }
    }

    pub fn max(&self) -> u8 {
        match *self {
            ThresholdBand::Off { max } | ThresholdBand::Band { max, .. } => max,
        }
    }

    pub fn min(&self) -> Option<u8> {
        match *self {
            ThresholdBand::Off { .. } => None,
            ThresholdBand::Band { min, .. } => Some(min),
        }
    }

    /// Opacity for a distance where larger means "less like the key".
    ///
    /// Without `mid`, with `d = distance / max` and `r = min / max`:
    /// `d < r` is fully background, `d > 1` fully foreground, otherwise `1 - d`.
    pub fn falloff(&self, distance: f32) -> f32 {
        let max = self.max() as f32;
        if max <= 0.0 {
            return 0.0;
        }

        match *self {
            ThresholdBand::Off { .. } => {
                if distance < max {
                    1.0
                } else {
                    0.0
                }
            }
            ThresholdBand::Band { min, mid: None, .. } => {
                let d = distance / max;
                let r = min as f32 / max;
                if d < r {
                    1.0
                } else if d > 1.0 {
                    0.0
                } else {
                    (1.0 - d).clamp(0.0, 1.0)
                }
            }
            ThresholdBand::Band { min, mid: Some(mid), .. } => {
                let (min, mid) = (min as f32, mid as f32);
                if distance < min {
                    1.0
                } else if distance >= max {
                    0.0
                } else if distance < mid {
                    1.0 - 0.5 * (distance - min) / (mid - min)
                } else {
                    0.5 * (max - distance) / (max - mid)
                }
            }
        }
    }

    /// Opacity for a proximity score where larger means "more like the key".
    pub fn rise(&self, score: f32) -> f32 {
        let max = self.max() as f32;
        if score > max {
            return 1.0;
        }

        match *self {
            ThresholdBand::Off { .. } => 0.0,
            ThresholdBand::Band { min, .. } if min as f32 >= max => 0.0,
            ThresholdBand::Band { min, mid: None, .. } => {
                let min = min as f32;
                if score >= min {
                    (score - min) / (max - min)
                } else {
                    0.0
                }
            }
            ThresholdBand::Band { min, mid: Some(mid), .. } => {
                let (min, mid) = (min as f32, mid as f32);
                if score < min {
                    0.0
                } else if score < mid {
                    0.5 * (score - min) / (mid - min)
                } else if max > mid {
                    0.5 + 0.5 * (score - mid) / (max - mid)
                } else {
                    1.0
                }
            }
        }
    }
}

/// The configured key color together with its derived representations.
///
/// The derived forms are private and recomputed on every `set`, so they can
/// never be observed out of date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyColor {
    color: Bgra,
    ycbcr: YCbCr,
    hsv: Hsv,
    luma: f32,
}

impl KeyColor {
    pub fn new(color: Bgra) -> Self {
        Self {
            color,
            ycbcr: YCbCr::from_pixel(color),
            hsv: Hsv::from_pixel(color),
            luma: luma(color),
        }
    }

    pub fn set(&mut self, color: Bgra) {
        *self = Self::new(color);
    }

    pub fn color(&self) -> Bgra {
        self.color
    }

    pub fn ycbcr(&self) -> YCbCr {
        self.ycbcr
    }

    pub fn hsv(&self) -> Hsv {
        self.hsv
    }

    pub fn luma(&self) -> f32 {
        self.luma
    }
}

impl Default for KeyColor {
    fn default() -> Self {
        Self::new(Bgra::GREEN)
    }
}

/// Everything a classifier needs, fixed before streaming starts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassifierConfig {
    pub key_color: KeyColor,
    pub thresholds: ThresholdBand,
    pub metric: Metric,
}

impl ClassifierConfig {
    pub fn new(key_color: Bgra, thresholds: ThresholdBand, metric: Metric) -> Self {
        Self {
            key_color: KeyColor::new(key_color),
            thresholds,
            metric,
        }
    }
}
