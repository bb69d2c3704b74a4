//! Frame timing utilities

use super::ring_buffer::RingBuffer;
use std::time::{Duration, Instant};

/// Rolling CPU time spent per frame.
#[derive(Debug)]
pub struct FrameTimer {
    frame_start: Instant,
    frame_times: RingBuffer<Duration>,
    frames: u64,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            frame_start: Instant::now(),
            frame_times: RingBuffer::new(capacity),
            frames: 0,
        }
    }

    pub fn begin(&mut self) {
        self.frame_start = Instant::now();
    }

    pub fn end(&mut self) {
        self.record(self.frame_start.elapsed());
    }

    /// Record a frame whose duration was measured elsewhere.
    pub fn record(&mut self, elapsed: Duration) {
        self.frame_times.push(elapsed);
        self.frames += 1;
    }

    /// Frames recorded since creation.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn fps(&self) -> f64 {
        let avg = self.frame_times.average();
        if avg.is_zero() {
            0.0
        } else {
            1.0 / avg.as_secs_f64()
        }
    }

    pub fn frame_time_ms(&self) -> f64 {
        self.frame_times.average().as_secs_f64() * 1000.0
    }

    pub fn frame_time_range_ms(&self) -> (f64, f64) {
        let (min, max) = self.frame_times.min_max();
        (min.as_secs_f64() * 1000.0, max.as_secs_f64() * 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_frames_drive_averages() {
        let mut timer = FrameTimer::new(4);
        assert_eq!(timer.fps(), 0.0);

        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.frames(), 2);
        assert!((timer.frame_time_ms() - 20.0).abs() < 1e-9);
        assert!((timer.fps() - 50.0).abs() < 1e-9);
        let (min, max) = timer.frame_time_range_ms();
        assert!((min - 10.0).abs() < 1e-9 && (max - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_begin_end_records_a_frame() {
        let mut timer = FrameTimer::new(2);
        timer.begin();
        timer.end();
        assert_eq!(timer.frames(), 1);
    }
}
