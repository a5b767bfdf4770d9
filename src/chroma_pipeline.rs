//! Chroma-key pipeline module
//!
//! This module removes a key color from a stream of camera frames in real
//! time, with separate modules for classification, compositing, the
//! per-frame transform, source/sink collaborators and the paced runtime.

pub mod classifier;
pub mod common;
pub mod compositor;
pub mod frame;
pub mod io;
pub mod runtime;
pub mod transform;

pub use common::{ChromaKeyError, ConfigurationError, Result};

pub use frame::{Bgra, Frame, FrameSlot};

pub use classifier::{
    Channel, Classifier, ClassifierConfig, HsvMode, KeyColor, MaxChannelVariant, Metric,
    OpacityMetric, ThresholdBand,
};

pub use compositor::{CompositeMode, Compositor};

pub use transform::PixelTransform;

pub use io::{
    Background, FrameSink, FrameSource, OutputComposer, RawFrameReader, SinkFormat, StreamSpec,
    WriterSink,
};

pub use runtime::{
    ChromaKeyPipeline, Pacer, PipelineConfig, PipelineConfigBuilder, PipelineCounters,
    PipelineReport, PipelineState, PipelineStatus, SinkRetryPolicy,
};
