//! Frame-based simulation time.
//!
//! The simulation advances in fixed frames.  `Frame(0)` is the state before
//! the first step; the first stepped frame is reported as `Frame(1)`.
//! Wall-clock mapping is `elapsed = frame / frame_rate`.

use std::fmt;
use std::time::Duration;

// ── Frame ────────────────────────────────────────────────────────────────────

/// An absolute frame counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Frame(pub u64);

impl Frame {
    pub const ZERO: Frame = Frame(0);

    #[inline]
    pub fn next(self) -> Frame {
        Frame(self.0 + 1)
    }

    #[inline]
    pub fn is_multiple_of(self, n: u64) -> bool {
        n != 0 && self.0 % n == 0
    }
}

impl std::ops::Add<u64> for Frame {
    type Output = Frame;
    #[inline]
    fn add(self, rhs: u64) -> Frame {
        Frame(self.0 + rhs)
    }
}

impl std::ops::Sub for Frame {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Frame) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

// ── FrameClock ────────────────────────────────────────────────────────────────

/// Tracks the current frame and converts it to simulated seconds.
#[derive(Clone, Debug)]
pub struct FrameClock {
    /// Frames per simulated second.
    pub frame_rate: u32,
    /// Last completed frame.
    pub current_frame: Frame,
}

impl FrameClock {
    pub fn new(frame_rate: u32) -> Self {
        Self {
            frame_rate,
            current_frame: Frame::ZERO,
        }
    }

    #[inline]
    pub fn advance(&mut self) {
        self.current_frame = self.current_frame.next();
    }

    /// Simulated seconds since frame 0.
    pub fn elapsed_secs(&self) -> f64 {
        if self.frame_rate == 0 {
            return 0.0;
        }
        self.current_frame.0 as f64 / self.frame_rate as f64
    }

    /// Wall-clock budget of one frame when running in real time.
    pub fn frame_duration(&self) -> Duration {
        if self.frame_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(1.0 / self.frame_rate as f64)
    }

    /// Frames spanning `secs` simulated seconds, rounded to the nearest frame.
    pub fn frames_for_secs(&self, secs: f64) -> u64 {
        (secs * self.frame_rate as f64).round().max(0.0) as u64
    }
}

impl fmt::Display for FrameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2} s)", self.current_frame, self.elapsed_secs())
    }
}
