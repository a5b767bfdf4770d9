use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the pipeline's frame counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineCounters {
    /// Frames delivered by the source
    pub frames_captured: u64,
    /// Captured frames replaced in the slot before processing took them
    pub frames_overwritten: u64,
    /// Frames written to the sink
    pub frames_processed: u64,
    /// Frames skipped because their geometry was inconsistent
    pub frames_rejected: u64,
    /// Frames given up on after the sink refused them
    pub frames_dropped: u64,
    /// Ticks that found no frame waiting
    pub empty_ticks: u64,
}

#[derive(Debug, Default)]
pub(crate) struct PipelineStats {
    captured: AtomicU64,
    overwritten: AtomicU64,
    processed: AtomicU64,
    rejected: AtomicU64,
    dropped: AtomicU64,
    empty_ticks: AtomicU64,
}

impl PipelineStats {
    pub(crate) fn record_captured(&self, overwrote: bool) {
        self.captured.fetch_add(1, Ordering::Relaxed);
        if overwrote {
            self.overwritten.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_empty_tick(&self) {
        self.empty_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> PipelineCounters {
        PipelineCounters {
            frames_captured: self.captured.load(Ordering::Relaxed),
            frames_overwritten: self.overwritten.load(Ordering::Relaxed),
            frames_processed: self.processed.load(Ordering::Relaxed),
            frames_rejected: self.rejected.load(Ordering::Relaxed),
            frames_dropped: self.dropped.load(Ordering::Relaxed),
            empty_ticks: self.empty_ticks.load(Ordering::Relaxed),
        }
    }
}
