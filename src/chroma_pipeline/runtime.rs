//! Pipeline runtime
//!
//! Configuration, pacing and the two-loop capture/processing pipeline that
//! drives the pixel transform in real time.

pub mod config;
mod pacer;
mod pipeline;
mod processing;
mod stats;


pub use config::{PipelineConfig, PipelineConfigBuilder, SinkRetryPolicy};
pub use pacer::Pacer;
pub use pipeline::{ChromaKeyPipeline, PipelineReport, PipelineState, PipelineStatus};
pub use stats::PipelineCounters;
