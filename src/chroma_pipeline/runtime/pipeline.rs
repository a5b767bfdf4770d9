use std::io::{Stdin, Stdout};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, trace};

use crate::chroma_pipeline::common::error::{ChromaKeyError, Result};
use crate::chroma_pipeline::frame::FrameSlot;
use crate::chroma_pipeline::io::{
    FrameSink, FrameSource, OutputComposer, RawFrameReader, WriterSink,
};
use crate::chroma_pipeline::runtime::config::PipelineConfig;
use crate::chroma_pipeline::runtime::pacer::Pacer;
use crate::chroma_pipeline::runtime::processing::{ProcessingStage, TickOutcome};
use crate::chroma_pipeline::runtime::stats::{PipelineCounters, PipelineStats};
use crate::chroma_pipeline::transform::PixelTransform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Streaming,
    Stopped,
}

impl PipelineState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => PipelineState::Idle,
            1 => PipelineState::Streaming,
            _ => PipelineState::Stopped,
        }
    }
}

/// Point-in-time view of a running pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStatus {
    pub state: PipelineState,
    pub counters: PipelineCounters,
    /// The error that stopped the pipeline, if one did
    pub failure: Option<String>,
}

/// Final counters of a pipeline that stopped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    pub counters: PipelineCounters,
    pub elapsed: Duration,
}

/// State shared by the capture and processing loops.
#[derive(Debug, Default)]
struct Shared {
    slot: FrameSlot,
    stop: AtomicBool,
    source_exhausted: AtomicBool,
    state: AtomicU8,
    stats: PipelineStats,
    failure: Mutex<Option<ChromaKeyError>>,
}

impl Shared {
    fn set_state(&self, state: PipelineState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn stopping(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    fn shut_down(&self) {
        self.stop.store(true, Ordering::Release);
        self.set_state(PipelineState::Stopped);
    }

    /// Records the first fatal error and stops both loops.
    fn fail(&self, err: ChromaKeyError) {
        error!(error = %err, "Pipeline failed");
        let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        if failure.is_none() {
            *failure = Some(err);
        }
        drop(failure);
        self.shut_down();
    }

    fn failure_message(&self) -> Option<String> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|e| e.to_string())
    }

    fn take_failure(&self) -> Option<ChromaKeyError> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Real-time chroma-key pipeline: Source -> latest-wins slot -> paced
/// transform -> Sink, on two threads.
pub struct ChromaKeyPipeline<S: FrameSource, K: FrameSink> {
    config: PipelineConfig,
    transform: Option<PixelTransform>,
    source: Option<S>,
    sink: Option<K>,
    shared: Arc<Shared>,
    handles: Vec<JoinHandle<()>>,
    started_at: Option<Instant>,
}

impl ChromaKeyPipeline<RawFrameReader<Stdin>, WriterSink<Stdout>> {
    /// Raw BGRA frames of `width`x`height` on stdin, raw output on stdout.
    pub fn stdio(width: usize, height: usize, config: PipelineConfig) -> Result<Self> {
        let source = RawFrameReader::new(std::io::stdin(), width, height)?;
        Self::with_custom(source, WriterSink::new(std::io::stdout()), config)
    }
}

impl<S: FrameSource + 'static, K: FrameSink + 'static> ChromaKeyPipeline<S, K> {
    /// Validates `config` and prepares the transform. Nothing runs until `start`.
    pub fn with_custom(source: S, sink: K, config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let transform = if config.chroma_key_enabled {
            let transform = PixelTransform::from_config(
                &config.classifier,
                config.full_mask,
                config.substitute_color,
            );
            Some(match config.worker_threads {
                Some(threads) => transform.with_worker_threads(threads)?,
                None => transform,
            })
        } else {
            None
        };

        Ok(Self {
            config,
            transform,
            source: Some(source),
            sink: Some(sink),
            shared: Arc::new(Shared::default()),
            handles: Vec::new(),
            started_at: None,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        self.shared.state()
    }

    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            state: self.shared.state(),
            counters: self.shared.stats.snapshot(),
            failure: self.shared.failure_message(),
        }
    }

    /// Moves the pipeline from `Idle` to `Streaming` and spawns both loops.
    #[instrument(skip(self), fields(fps = self.config.target_fps))]
    pub fn start(&mut self) -> Result<()> {
        if self.state() != PipelineState::Idle {
            return Err(ChromaKeyError::InvalidState("already started"));
        }
        let (Some(source), Some(sink)) = (self.source.take(), self.sink.take()) else {
            return Err(ChromaKeyError::InvalidState("missing its source or sink"));
        };

        let pacer = Pacer::new(self.config.target_fps)?;
        let stage = ProcessingStage::new(
            self.transform.clone(),
            OutputComposer::new(self.config.output_format, self.config.background.clone()),
            sink,
            self.config.target_fps,
            self.config.sink_retry,
        );

        self.shared.set_state(PipelineState::Streaming);
        self.started_at = Some(Instant::now());

        let shared = Arc::clone(&self.shared);
        let capture = thread::Builder::new()
            .name("chromakey-capture".to_string())
            .spawn(move || run_capture(source, &shared));
        let capture = match capture {
            Ok(handle) => handle,
            Err(e) => {
                self.shared.shut_down();
                return Err(e.into());
            }
        };
        self.handles.push(capture);

        let shared = Arc::clone(&self.shared);
        let processing = thread::Builder::new()
            .name("chromakey-processing".to_string())
            .spawn(move || run_processing(stage, pacer, &shared));
        match processing {
            Ok(handle) => self.handles.push(handle),
            Err(e) => {
                self.shared.shut_down();
                return Err(e.into());
            }
        }

        info!(
            metric = self.config.classifier.metric.name(),
            chroma_key = self.config.chroma_key_enabled,
            "Pipeline streaming"
        );
        Ok(())
    }

    /// Asks both loops to stop. Each notices at the top of its next iteration;
    /// a blocked source read or sink write is not interrupted.
    pub fn stop(&self) {
        info!("Stop requested");
        self.shared.stop.store(true, Ordering::Release);
    }

    /// Waits for both loops to finish.
    ///
    /// Returns the first fatal error if the pipeline failed, and
    /// `InvalidState` if it was never started.
    pub fn join(&mut self) -> Result<PipelineReport> {
        if self.state() == PipelineState::Idle {
            return Err(ChromaKeyError::InvalidState("not started"));
        }
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                self.shared.fail(ChromaKeyError::InvalidState("stopped by a panicked loop"));
            }
        }
        self.shared.set_state(PipelineState::Stopped);

        if let Some(err) = self.shared.take_failure() {
            return Err(err);
        }
        let counters = self.shared.stats.snapshot();
        let elapsed = self.started_at.map(|t| t.elapsed()).unwrap_or_default();
        info!(
            captured = counters.frames_captured,
            processed = counters.frames_processed,
            overwritten = counters.frames_overwritten,
            dropped = counters.frames_dropped,
            rejected = counters.frames_rejected,
            "Pipeline stopped"
        );
        Ok(PipelineReport { counters, elapsed })
    }

    /// Starts the pipeline and blocks until it stops.
    pub fn run(mut self) -> Result<PipelineReport> {
        self.start()?;
        self.join()
    }
}

impl<S: FrameSource, K: FrameSink> Drop for ChromaKeyPipeline<S, K> {
    fn drop(&mut self) {
        // Loops still running see the flag and exit on their own.
        self.shared.stop.store(true, Ordering::Release);
    }
}

fn run_capture<S: FrameSource>(source: S, shared: &Shared) {
    match capture_loop(source, shared) {
        Ok(()) => shared.source_exhausted.store(true, Ordering::Release),
        // The failure is recorded first so processing never mistakes it for a clean end.
        Err(e) => {
            shared.fail(e);
            shared.source_exhausted.store(true, Ordering::Release);
        }
    }
}

fn capture_loop<S: FrameSource>(mut source: S, shared: &Shared) -> Result<()> {
    let mut sequence = 0u64;
    while !shared.stopping() {
        let Some(frame) = source.read_frame()? else {
            info!(frames = sequence, "Source reached end of stream");
            return Ok(());
        };
        sequence += 1;

        let displaced = shared.slot.replace(frame.with_sequence(sequence));
        shared.stats.record_captured(displaced.is_some());
        if let Some(old) = displaced {
            trace!(dropped = old.sequence, latest = sequence, "Overwrote unconsumed frame");
        }
    }
    Ok(())
}

fn run_processing<K: FrameSink>(stage: ProcessingStage<K>, pacer: Pacer, shared: &Shared) {
    if let Err(e) = processing_loop(stage, pacer, shared) {
        shared.fail(e);
    }
    shared.shut_down();
}

fn processing_loop<K: FrameSink>(
    mut stage: ProcessingStage<K>,
    mut pacer: Pacer,
    shared: &Shared,
) -> Result<()> {
    loop {
        let late = pacer.wait();
        if shared.stopping() {
            return Ok(());
        }
        if late > pacer.interval() {
            trace!(late_ms = late.as_millis() as u64, "Tick fired late");
        }

        // Read before taking: once the source is done, an empty slot stays empty.
        let exhausted = shared.source_exhausted.load(Ordering::Acquire);
        let outcome = stage.tick(&shared.slot, &shared.stats)?;
        if outcome == TickOutcome::Idle && exhausted {
            info!("Source exhausted and slot drained");
            return Ok(());
        }
    }
}
