//! Bar width over time, and splitting of frame delays into fixed-rate slices
//!
//! All times are in GIF delay units (1/100th of a second), so that the clock is exact.

use crate::error::{CatResult, Error};
use std::num::NonZeroU16;

/// Number of bar columns (starting at x=0) at `elapsed` time out of `total`.
///
/// Never decreases as `elapsed` grows, and never exceeds `width`.
/// Zero-length animations get the full width.
#[must_use]
pub fn progress_width(elapsed: u64, total: u64, width: u16) -> u16 {
    if total == 0 || elapsed >= total {
        return width;
    }
    (u64::from(width) * elapsed / total) as u16
}

/// Delay of each re-timed frame
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameInterval(NonZeroU16);

impl FrameInterval {
    /// `round(100 / fps)`. Rates that would need delays shorter than 1/100s are rejected.
    pub fn from_fps(fps: u16) -> CatResult<Self> {
        if fps == 0 {
            return Err(Error::InvalidFps(fps));
        }
        let fps32 = u32::from(fps);
        let delay = (200 + fps32) / (2 * fps32);
        NonZeroU16::new(delay as u16)
            .map(Self)
            .ok_or(Error::InvalidFps(fps))
    }

    #[inline]
    #[must_use]
    pub fn delay(self) -> u16 {
        self.0.get()
    }

    /// Lengths of slices that together last exactly `delay`
    #[must_use]
    pub fn slices(self, delay: u16) -> Slices {
        Slices {
            interval: self.delay(),
            full: delay / self.delay(),
            remainder: delay % self.delay(),
            keep_empty: delay == 0,
        }
    }
}

/// Iterator returned by [`FrameInterval::slices`]
///
/// A zero delay gives one zero-length slice, so that the frame still gets shown.
#[derive(Debug, Clone)]
pub struct Slices {
    interval: u16,
    full: u16,
    remainder: u16,
    keep_empty: bool,
}

impl Iterator for Slices {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        if self.full > 0 {
            self.full -= 1;
            Some(self.interval)
        } else if self.remainder > 0 {
            Some(std::mem::take(&mut self.remainder))
        } else if self.keep_empty {
            self.keep_empty = false;
            Some(0)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.full as usize + usize::from(self.remainder > 0) + usize::from(self.keep_empty);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Slices {}
