use std::thread;
use std::time::{Duration, Instant};

use crate::chroma_pipeline::common::error::{ConfigurationError, Result};

/// Fixed-interval driver for the processing loop.
///
/// The first tick fires one interval after creation. A tick that fires late
/// pushes the schedule back instead of bursting to catch up.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    next_tick: Instant,
}

impl Pacer {
    pub fn new(fps: u32) -> Result<Self> {
        if fps == 0 {
            return Err(ConfigurationError::InvalidFrameRate(0).into());
        }
        let interval = Duration::from_secs(1) / fps;
        Ok(Self {
            interval,
            next_tick: Instant::now() + interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleeps until the next tick and returns how late it fired.
    pub fn wait(&mut self) -> Duration {
        let now = Instant::now();
        if now < self.next_tick {
            thread::sleep(self.next_tick - now);
        }

        let fired = Instant::now();
        let late = fired.saturating_duration_since(self.next_tick);
        self.next_tick += self.interval;
        if self.next_tick <= fired {
            self.next_tick = fired + self.interval;
        }
        late
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_from_fps() {
        assert_eq!(Pacer::new(25).unwrap().interval(), Duration::from_millis(40));
        assert!(Pacer::new(0).is_err());
    }

    #[test]
    fn test_ticks_are_spaced_by_interval() {
        let mut pacer = Pacer::new(50).unwrap();
        let start = Instant::now();
        pacer.wait();
        pacer.wait();
        pacer.wait();
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn test_late_tick_does_not_burst() {
        let mut pacer = Pacer::new(50).unwrap();
        thread::sleep(Duration::from_millis(100));

        let late = pacer.wait();
        assert!(late >= Duration::from_millis(40));

        let before = Instant::now();
        pacer.wait();
        assert!(before.elapsed() >= Duration::from_millis(15));
    }
}
