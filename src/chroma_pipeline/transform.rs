//! Per-pixel classification and compositing over whole frames.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::trace;

use crate::chroma_pipeline::classifier::{Classifier, ClassifierConfig, OpacityMetric};
use crate::chroma_pipeline::common::error::{ConfigurationError, Result};
use crate::chroma_pipeline::compositor::Compositor;
use crate::chroma_pipeline::frame::{Bgra, Frame, BYTES_PER_PIXEL};

/// Applies a classifier and compositor to every pixel of a frame.
///
/// Each output pixel depends only on its own input bytes and the immutable
/// configuration, so any split of the rows across workers gives the same
/// bytes. Stride padding is never read or written.
#[derive(Debug, Clone)]
pub struct PixelTransform {
    classifier: Classifier,
    compositor: Compositor,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl PixelTransform {
    pub fn new(classifier: Classifier, compositor: Compositor) -> Self {
        Self {
            classifier,
            compositor,
            pool: None,
        }
    }

    pub fn from_config(config: &ClassifierConfig, full_mask: bool, substitute: Option<Bgra>) -> Self {
        Self::new(
            Classifier::from_config(config),
            Compositor::for_metric(full_mask, substitute, &config.metric),
        )
    }

    /// Runs the per-frame parallel region on a dedicated pool of `threads`
    /// workers instead of rayon's global pool.
    pub fn with_worker_threads(mut self, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(ConfigurationError::InvalidWorkerCount("0".to_string()).into());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("chromakey-worker-{i}"))
            .build()
            .map_err(|e| ConfigurationError::InvalidWorkerCount(e.to_string()))?;
        self.pool = Some(Arc::new(pool));
        Ok(self)
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    #[inline]
    pub fn transform_pixel(&self, pixel: Bgra) -> Bgra {
        let opacity = self.classifier.opacity(pixel);
        self.compositor.composite(pixel, opacity)
    }

    /// `row` holds exactly the pixel bytes of one row.
    fn transform_row(&self, row: &mut [u8]) {
        for bytes in row.chunks_exact_mut(BYTES_PER_PIXEL) {
            let out = self.transform_pixel(Bgra::from_bytes(bytes));
            bytes.copy_from_slice(&out.to_bytes());
        }
    }

    /// Transforms `frame` in place, one row per parallel task.
    pub fn apply(&self, frame: &mut Frame) -> Result<()> {
        self.apply_in_bands(frame, 1)
    }

    /// Transforms `frame` in place, splitting it into bands of
    /// `rows_per_band` rows that are processed in parallel.
    pub fn apply_in_bands(&self, frame: &mut Frame, rows_per_band: usize) -> Result<()> {
        frame.validate()?;
        let row_bytes = frame.row_bytes();
        let pixel_row_bytes = frame.pixel_row_bytes();
        let band_bytes = row_bytes * rows_per_band.max(1);
        trace!(
            width = frame.width,
            height = frame.height,
            rows_per_band,
            "Transforming frame"
        );

        let run = |data: &mut [u8]| {
            data.par_chunks_mut(band_bytes).for_each(|band| {
                for row in band.chunks_mut(row_bytes) {
                    self.transform_row(&mut row[..pixel_row_bytes]);
                }
            });
        };
        match &self.pool {
            Some(pool) => pool.install(|| run(&mut frame.data)),
            None => run(&mut frame.data),
        }
        Ok(())
    }

    /// Single-threaded reference path.
    pub fn apply_sequential(&self, frame: &mut Frame) -> Result<()> {
        frame.validate()?;
        let row_bytes = frame.row_bytes();
        let pixel_row_bytes = frame.pixel_row_bytes();
        for row in frame.data.chunks_mut(row_bytes) {
            self.transform_row(&mut row[..pixel_row_bytes]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chroma_pipeline::classifier::{HsvMode, Metric, ThresholdBand};
    use crate::chroma_pipeline::common::error::ChromaKeyError;

    /// Deterministic pseudo-random frame with 12 bytes of padding per row.
    fn noisy_frame(width: usize, height: usize) -> Frame {
        let stride = width * BYTES_PER_PIXEL + 12;
        let mut state = 0x2545_F491_u32;
        let data = (0..stride * height)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 24) as u8
            })
            .collect();
        Frame {
            width,
            height,
            stride: stride as isize,
            data,
            sequence: 0,
        }
    }

    fn transform(metric: Metric) -> PixelTransform {
        let config = ClassifierConfig::new(
            Bgra::GREEN,
            ThresholdBand::new(Some(8), None, 96).unwrap(),
            metric,
        );
        PixelTransform::from_config(&config, true, Some(Bgra::rgb(255, 0, 255)))
    }

    #[test]
    fn test_partitioning_does_not_change_output() {
        for metric in [
            Metric::default(),
            Metric::YCbCr,
            Metric::Rgb,
            Metric::Luma,
            Metric::Redmean,
            Metric::Hsv { mode: HsvMode::Full },
        ] {
            let t = transform(metric);
            let mut reference = noisy_frame(37, 23);
            t.apply_sequential(&mut reference).unwrap();

            for rows_per_band in [1, 2, 5, 23, 100] {
                let mut frame = noisy_frame(37, 23);
                t.apply_in_bands(&mut frame, rows_per_band).unwrap();
                assert_eq!(frame, reference, "{} bands of {}", metric.name(), rows_per_band);
            }

            let pooled = t.clone().with_worker_threads(3).unwrap();
            let mut frame = noisy_frame(37, 23);
            pooled.apply(&mut frame).unwrap();
            assert_eq!(frame, reference);
        }
    }

    #[test]
    fn test_stride_padding_is_untouched() {
        let original = noisy_frame(5, 4);
        let mut frame = original.clone();
        transform(Metric::Rgb).apply(&mut frame).unwrap();

        let row_bytes = frame.row_bytes();
        for y in 0..frame.height {
            let pad = y * row_bytes + frame.pixel_row_bytes()..(y + 1) * row_bytes;
            assert_eq!(frame.data[pad.clone()], original.data[pad]);
        }
    }

    #[test]
    fn test_key_pixel_becomes_substitute() {
        for metric in [Metric::default(), Metric::YCbCr, Metric::Redmean, Metric::Luma] {
            let mut frame = Frame::filled(4, 2, Bgra::GREEN);
            transform(metric).apply(&mut frame).unwrap();
            assert_eq!(frame.pixel(3, 1), Some(Bgra::rgb(255, 0, 255)), "{}", metric.name());
        }
    }

    #[test]
    fn test_malformed_frame_is_rejected_untouched() {
        let mut frame = Frame::filled(4, 4, Bgra::GREEN);
        frame.data.truncate(40);
        let before = frame.clone();

        let result = transform(Metric::Rgb).apply(&mut frame);
        assert!(matches!(result, Err(ChromaKeyError::MalformedFrame(_))));
        assert_eq!(frame, before);
    }

    #[test]
    fn test_zero_worker_threads_is_a_configuration_error() {
        let result = transform(Metric::Rgb).with_worker_threads(0);
        assert!(matches!(result, Err(e) if e.is_configuration()));
    }
}
