//! Time management utilities
//!
//! Animation state is a function of elapsed wall-clock seconds, never of frame
//! count. [`FrameClock`] produces the [`FrameTime`] handed to every refresh
//! callback, either from the real clock or from a fixed simulated step.

use std::time::{Duration, Instant};

/// Clock input for one refresh callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Seconds since the clock started
    pub elapsed: f32,
    /// Seconds since the previous frame
    pub delta: f32,
    /// Index of this frame, starting at 0
    pub frame: u64,
}

impl FrameTime {
    /// Frame time at an arbitrary elapsed instant (delta and index zero)
    pub fn at(elapsed: f32) -> Self {
        Self {
            elapsed,
            delta: 0.0,
            frame: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ClockSource {
    Realtime { start: Instant },
    Fixed { step: f32 },
}

/// Source of [`FrameTime`] values for a frame loop
#[derive(Debug, Clone)]
pub struct FrameClock {
    source: ClockSource,
    last_elapsed: f32,
    frame: u64,
}

impl FrameClock {
    /// Clock that reads the monotonic system clock
    pub fn realtime() -> Self {
        Self {
            source: ClockSource::Realtime { start: Instant::now() },
            last_elapsed: 0.0,
            frame: 0,
        }
    }

    /// Clock that advances by a fixed step per frame (headless playback)
    pub fn fixed_rate(frames_per_second: u32) -> Self {
        Self {
            source: ClockSource::Fixed {
                step: 1.0 / frames_per_second.max(1) as f32,
            },
            last_elapsed: 0.0,
            frame: 0,
        }
    }

    /// Produce the time for the next frame
    pub fn next_frame(&mut self) -> FrameTime {
        let elapsed = match self.source {
            ClockSource::Realtime { start } => start.elapsed().as_secs_f32(),
            ClockSource::Fixed { step } => self.frame as f32 * step,
        };
        let time = FrameTime {
            elapsed,
            delta: if self.frame == 0 { 0.0 } else { elapsed - self.last_elapsed },
            frame: self.frame,
        };
        self.last_elapsed = elapsed;
        self.frame += 1;
        time
    }

    /// Number of frames produced so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed += start.elapsed();
            self.start_time = None;
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }
}
