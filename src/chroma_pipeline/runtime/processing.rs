use std::thread;

use tracing::{debug, info, warn};

use crate::chroma_pipeline::common::error::{ChromaKeyError, Result};
use crate::chroma_pipeline::frame::{Frame, FrameSlot};
use crate::chroma_pipeline::io::{FrameSink, OutputComposer, StreamSpec};
use crate::chroma_pipeline::runtime::config::SinkRetryPolicy;
use crate::chroma_pipeline::runtime::stats::PipelineStats;
use crate::chroma_pipeline::transform::PixelTransform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    /// Nothing was waiting in the slot
    Idle,
    Delivered { sequence: u64 },
    /// The frame's geometry was inconsistent and it was skipped
    Rejected { sequence: u64 },
    /// The sink refused the frame after every retry
    Dropped { sequence: u64 },
}

/// Work done on each pacer tick: take, transform, pack, write.
pub(crate) struct ProcessingStage<K> {
    transform: Option<PixelTransform>,
    composer: OutputComposer,
    sink: K,
    fps: u32,
    retry: Option<SinkRetryPolicy>,
    stream: Option<StreamSpec>,
    consecutive_drops: u32,
}

impl<K: FrameSink> ProcessingStage<K> {
    pub(crate) fn new(
        transform: Option<PixelTransform>,
        composer: OutputComposer,
        sink: K,
        fps: u32,
        retry: Option<SinkRetryPolicy>,
    ) -> Self {
        Self {
            transform,
            composer,
            sink,
            fps,
            retry,
            stream: None,
            consecutive_drops: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn sink(&self) -> &K {
        &self.sink
    }

    pub(crate) fn tick(&mut self, slot: &FrameSlot, stats: &PipelineStats) -> Result<TickOutcome> {
        // The slot lock is released here, before any per-frame work.
        let Some(mut frame) = slot.take() else {
            stats.record_empty_tick();
            return Ok(TickOutcome::Idle);
        };
        let sequence = frame.sequence;
        let _span = tracing::debug_span!("tick", sequence).entered();

        let packed = match self.prepare(&mut frame) {
            Ok(packed) => packed,
            Err(ChromaKeyError::MalformedFrame(reason)) => {
                warn!(sequence, %reason, "Rejecting malformed frame");
                stats.record_rejected();
                return Ok(TickOutcome::Rejected { sequence });
            }
            Err(e) => return Err(e),
        };

        if self.deliver(&packed, sequence)? {
            stats.record_processed();
            Ok(TickOutcome::Delivered { sequence })
        } else {
            stats.record_dropped();
            Ok(TickOutcome::Dropped { sequence })
        }
    }

    fn negotiate(&mut self, frame: &Frame) -> Result<StreamSpec> {
        let spec = StreamSpec {
            width: frame.width,
            height: frame.height,
            format: self.composer.format(),
            fps: self.fps,
        };
        self.composer.prepare(spec.width, spec.height)?;
        self.sink.negotiate(&spec)?;
        info!(
            width = spec.width,
            height = spec.height,
            format = ?spec.format,
            "Sink negotiated from first frame"
        );
        self.stream = Some(spec);
        Ok(spec)
    }

    fn prepare(&mut self, frame: &mut Frame) -> Result<Vec<u8>> {
        frame.validate()?;
        let spec = match self.stream {
            Some(spec) => spec,
            None => self.negotiate(frame)?,
        };
        if (frame.width, frame.height) != (spec.width, spec.height) {
            return Err(ChromaKeyError::MalformedFrame(format!(
                "frame is {}x{} but the stream was negotiated at {}x{}",
                frame.width, frame.height, spec.width, spec.height
            )));
        }

        if let Some(transform) = &self.transform {
            let _span = tracing::debug_span!("chroma_key").entered();
            transform.apply(frame)?;
        }
        let _span = tracing::debug_span!("compose").entered();
        self.composer.compose(frame)
    }

    /// Returns false when the frame was dropped under the retry policy.
    fn deliver(&mut self, packed: &[u8], sequence: u64) -> Result<bool> {
        let _span = tracing::debug_span!("write_sink", bytes = packed.len()).entered();
        let Some(policy) = self.retry else {
            self.sink.write_frame(packed)?;
            return Ok(true);
        };

        let mut backoff = policy.initial_backoff;
        let mut last_error = None;
        for attempt in 1..=policy.max_attempts.max(1) {
            match self.sink.write_frame(packed) {
                Ok(()) => {
                    self.consecutive_drops = 0;
                    return Ok(true);
                }
                Err(e) => {
                    debug!(sequence, attempt, error = %e, "Sink write failed");
                    last_error = Some(e);
                    if attempt < policy.max_attempts {
                        thread::sleep(backoff);
                        backoff = backoff.saturating_mul(2);
                    }
                }
            }
        }

        self.consecutive_drops += 1;
        let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
        warn!(
            sequence,
            consecutive = self.consecutive_drops,
            %reason,
            "Dropping frame the sink would not accept"
        );
        if self.consecutive_drops >= policy.max_consecutive_drops {
            return Err(ChromaKeyError::SinkUnavailable(format!(
                "{} frames in a row refused: {}",
                self.consecutive_drops, reason
            )));
        }
        Ok(false)
    }
}
