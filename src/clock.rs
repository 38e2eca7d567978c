//! Node-local monotonic clock
//!
//! Each node stamps records with milliseconds since its own start; the two
//! nodes share no clock epoch, so timestamps are only comparable on the
//! node that produced them.

use std::time::Instant;

/// Milliseconds since clock creation, wrapping at 2^32
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}
