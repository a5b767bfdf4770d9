use std::io::{ErrorKind, Write};

use tracing::{debug, info};

use crate::chroma_pipeline::common::error::{ChromaKeyError, Result};
use crate::chroma_pipeline::io::sink::{FrameSink, StreamSpec};

/// Sink that streams frames into any writer (a pipe, file or process stdin)
/// without framing or headers.
///
/// A write that fails partway through a frame leaves `resume_at` pointing at
/// the first unwritten byte. The next call continues from there, so bytes are
/// never repeated and frame boundaries on the wire never shift.
pub struct WriterSink<W> {
    writer: W,
    spec: Option<StreamSpec>,
    frames_written: u64,
    resume_at: usize,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            spec: None,
            frames_written: 0,
            resume_at: 0,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> FrameSink for WriterSink<W> {
    fn negotiate(&mut self, spec: &StreamSpec) -> Result<()> {
        info!(
            width = spec.width,
            height = spec.height,
            format = ?spec.format,
            fps = spec.fps,
            "Raw output stream negotiated"
        );
        self.spec = Some(*spec);
        Ok(())
    }

    fn write_frame(&mut self, data: &[u8]) -> Result<()> {
        let row_bytes = match self.spec {
            Some(spec) if spec.row_bytes() > 0 => spec.row_bytes(),
            _ => data.len().max(1),
        };

        if self.resume_at > data.len() {
            self.resume_at = 0;
        }
        if self.resume_at > 0 {
            debug!(offset = self.resume_at, bytes = data.len(), "Resuming partially written frame");
        }

        while self.resume_at < data.len() {
            let row_end = ((self.resume_at / row_bytes + 1) * row_bytes).min(data.len());
            match self.writer.write(&data[self.resume_at..row_end]) {
                Ok(0) => {
                    return Err(ChromaKeyError::SinkUnavailable(
                        "writer accepted no bytes".to_string(),
                    ));
                }
                Ok(n) => self.resume_at += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ChromaKeyError::SinkUnavailable(e.to_string())),
            }
        }
        // A failed flush is retried without writing the frame again.
        self.writer
            .flush()
            .map_err(|e| ChromaKeyError::SinkUnavailable(e.to_string()))?;

        self.resume_at = 0;
        self.frames_written += 1;
        debug!(bytes = data.len(), frame = self.frames_written, "Frame written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chroma_pipeline::io::SinkFormat;
    use std::io::{Read, Seek, SeekFrom};

    #[test]
    fn test_frames_are_written_back_to_back() {
        let mut file = tempfile::tempfile().unwrap();
        {
            let mut sink = WriterSink::new(&mut file);
            sink.negotiate(&StreamSpec {
                width: 2,
                height: 2,
                format: SinkFormat::Rgb24,
                fps: 25,
            })
            .unwrap();
            sink.write_frame(&[1u8; 12]).unwrap();
            sink.write_frame(&[2u8; 12]).unwrap();
            assert_eq!(sink.frames_written(), 2);
        }

        file.seek(SeekFrom::Start(0)).unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        assert_eq!(contents.len(), 24);
        assert!(contents[..12].iter().all(|&b| b == 1));
        assert!(contents[12..].iter().all(|&b| b == 2));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "consumer went away"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Accepts `fail_after` bytes, then fails once.
    struct FlakyWriter {
        out: Vec<u8>,
        fail_after: Option<usize>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = match self.fail_after {
                Some(limit) if self.out.len() >= limit => {
                    self.fail_after = None;
                    return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "hiccup"));
                }
                Some(limit) => buf.len().min(limit - self.out.len()),
                None => buf.len(),
            };
            self.out.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_retry_after_partial_write_resumes() {
        let mut sink = WriterSink::new(FlakyWriter {
            out: Vec::new(),
            fail_after: Some(3),
        });
        sink.negotiate(&StreamSpec {
            width: 2,
            height: 1,
            format: SinkFormat::Rgb24,
            fps: 25,
        })
        .unwrap();

        let frame = [1u8, 2, 3, 4, 5, 6];
        assert!(matches!(
            sink.write_frame(&frame),
            Err(ChromaKeyError::SinkUnavailable(_))
        ));
        assert_eq!(sink.frames_written(), 0);

        sink.write_frame(&frame).unwrap();
        sink.write_frame(&[7u8; 6]).unwrap();
        assert_eq!(sink.frames_written(), 2);
        assert_eq!(
            sink.into_inner().out,
            vec![1, 2, 3, 4, 5, 6, 7, 7, 7, 7, 7, 7]
        );
    }

    #[test]
    fn test_write_failure_is_sink_unavailable() {
        let mut sink = WriterSink::new(BrokenPipe);
        assert!(matches!(
            sink.write_frame(&[0u8; 3]),
            Err(ChromaKeyError::SinkUnavailable(_))
        ));
    }
}
