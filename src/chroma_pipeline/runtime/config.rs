//! Pipeline configuration types

use std::time::Duration;

use crate::chroma_pipeline::classifier::{
    Channel, ClassifierConfig, HsvMode, KeyColor, Metric, ThresholdBand,
};
use crate::chroma_pipeline::common::error::{ConfigurationError, Result};
use crate::chroma_pipeline::frame::Bgra;
use crate::chroma_pipeline::io::{Background, SinkFormat};

/// What to do when the sink refuses a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkRetryPolicy {
    /// Write attempts per frame, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each further retry
    pub initial_backoff: Duration,
    /// Dropped frames in a row after which the sink is declared unavailable
    pub max_consecutive_drops: u32,
}

impl Default for SinkRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
            max_consecutive_drops: 25,
        }
    }
}

/// Configuration for the chroma-key pipeline. Immutable once streaming starts.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Output frames per second
    pub target_fps: u32,
    /// When false, frames pass through without classification
    pub chroma_key_enabled: bool,
    /// Allow recoloring toward `substitute_color` instead of alpha-only output
    pub full_mask: bool,
    pub classifier: ClassifierConfig,
    pub substitute_color: Option<Bgra>,
    /// Pixel format negotiated with the sink
    pub output_format: SinkFormat,
    pub background: Background,
    /// `None` makes the first failed sink write fatal
    pub sink_retry: Option<SinkRetryPolicy>,
    /// Size of the per-frame worker pool; `None` uses every available core
    pub worker_threads: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_fps: 25,
            chroma_key_enabled: true,
            full_mask: false,
            classifier: ClassifierConfig::default(),
            substitute_color: None,
            output_format: SinkFormat::Rgb24,
            background: Background::None,
            sink_retry: Some(SinkRetryPolicy::default()),
            worker_threads: None,
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_fps == 0 {
            return Err(ConfigurationError::InvalidFrameRate(0).into());
        }
        self.classifier.thresholds.validate()?;
        if let Background::Image(image) = &self.background {
            image.validate()?;
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigurationError::InvalidWorkerCount("0".to_string()).into());
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }
}

/// Builder for PipelineConfig
#[derive(Default)]
pub struct PipelineConfigBuilder {
    target_fps: Option<i64>,
    chroma_key_enabled: Option<bool>,
    full_mask: Option<bool>,
    key_color: Option<Bgra>,
    thresholds: Option<(Option<u8>, Option<u8>, u8)>,
    metric: Option<Metric>,
    channel: Option<Channel>,
    velocity: Option<u8>,
    hsv_mode: Option<HsvMode>,
    substitute_color: Option<Option<Bgra>>,
    output_format: Option<SinkFormat>,
    background: Option<Background>,
    sink_retry: Option<Option<SinkRetryPolicy>>,
    worker_threads: Option<Option<usize>>,
}

impl PipelineConfigBuilder {
    pub fn target_fps(mut self, fps: i64) -> Self {
        self.target_fps = Some(fps);
        self
    }

    pub fn chroma_key_enabled(mut self, enabled: bool) -> Self {
        self.chroma_key_enabled = Some(enabled);
        self
    }

    pub fn full_mask(mut self, full_mask: bool) -> Self {
        self.full_mask = Some(full_mask);
        self
    }

    pub fn key_color(mut self, color: Bgra) -> Self {
        self.key_color = Some(color);
        self
    }

    pub fn thresholds(mut self, min: Option<u8>, mid: Option<u8>, max: u8) -> Self {
        self.thresholds = Some((min, mid, max));
        self
    }

    pub fn metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }

    /// Max-channel metric only.
    pub fn channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Max-channel metric only.
    pub fn velocity(mut self, velocity: u8) -> Self {
        self.velocity = Some(velocity);
        self
    }

    /// HSV metric only.
    pub fn hsv_mode(mut self, mode: HsvMode) -> Self {
        self.hsv_mode = Some(mode);
        self
    }

    pub fn substitute_color(mut self, color: Option<Bgra>) -> Self {
        self.substitute_color = Some(color);
        self
    }

    pub fn output_format(mut self, format: SinkFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }

    pub fn sink_retry(mut self, policy: Option<SinkRetryPolicy>) -> Self {
        self.sink_retry = Some(policy);
        self
    }

    pub fn worker_threads(mut self, threads: Option<usize>) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    fn resolve_metric(&self, default: Metric) -> Metric {
        match self.metric.unwrap_or(default) {
            Metric::MaxChannel {
                channel,
                velocity,
                variant,
            } => Metric::MaxChannel {
                channel: self.channel.unwrap_or(channel),
                velocity: self.velocity.unwrap_or(velocity),
                variant,
            },
            Metric::Hsv { mode } => Metric::Hsv {
                mode: self.hsv_mode.unwrap_or(mode),
            },
            other => other,
        }
    }

    pub fn build(self) -> Result<PipelineConfig> {
        let default = PipelineConfig::default();

        let target_fps = match self.target_fps {
            None => default.target_fps,
            Some(fps) => u32::try_from(fps)
                .ok()
                .filter(|&fps| fps > 0)
                .ok_or(ConfigurationError::InvalidFrameRate(fps))?,
        };

        let thresholds = match self.thresholds {
            Some((min, mid, max)) => ThresholdBand::new(min, mid, max)?,
            None => default.classifier.thresholds,
        };

        let key_color = self
            .key_color
            .map(KeyColor::new)
            .unwrap_or(default.classifier.key_color);

        let config = PipelineConfig {
            target_fps,
            chroma_key_enabled: self.chroma_key_enabled.unwrap_or(default.chroma_key_enabled),
            full_mask: self.full_mask.unwrap_or(default.full_mask),
            classifier: ClassifierConfig {
                key_color,
                thresholds,
                metric: self.resolve_metric(default.classifier.metric),
            },
            substitute_color: self.substitute_color.unwrap_or(default.substitute_color),
            output_format: self.output_format.unwrap_or(default.output_format),
            background: self.background.unwrap_or(default.background),
            sink_retry: self.sink_retry.unwrap_or(default.sink_retry),
            worker_threads: self.worker_threads.unwrap_or(default.worker_threads),
        };
        config.validate()?;
        Ok(config)
    }
}
