//! Ultrasonic ranging sampler
//!
//! Converts noisy trigger/echo timing from an HC-SR04-class rangefinder into
//! a validated centimeter reading. The hardware sits behind the [`EchoTimer`]
//! trait: pulse the trigger line, then measure the round-trip time of the
//! echo bounded by a timeout. Everything above that seam (speed-of-sound
//! conversion, plausibility window, bounded retry) is pure logic.
//!
//! A failed cycle is a valid outcome, not an error: after all retries the
//! sampler reports `None` and the caller transmits the record anyway with
//! the on-wire no-reading sentinel.

use crate::error::Result;
use std::thread;
use std::time::Duration;

/// Upper bound on waiting for the echo transition per attempt
pub const ECHO_TIMEOUT: Duration = Duration::from_millis(30);

/// Pause between attempts to let the transducer settle
pub const SETTLE_PAUSE: Duration = Duration::from_millis(80);

/// Attempts per sampling cycle before giving up
pub const MAX_ATTEMPTS: u32 = 3;

/// Physically plausible reading window for this sensor class (cm)
const MIN_PLAUSIBLE_CM: u64 = 2;
const MAX_PLAUSIBLE_CM: u64 = 4000;

/// Speed of sound at room temperature, m/s
const SPEED_OF_SOUND_M_S: u64 = 343;

/// Hardware seam for the rangefinder
///
/// One call is one measurement attempt: pulse the trigger output, then wait
/// for the echo input transition. Returns the round-trip time, or `None` if
/// no echo was observed within `timeout`.
pub trait EchoTimer: Send {
    fn trigger_and_measure(&mut self, timeout: Duration) -> Result<Option<Duration>>;
}

impl EchoTimer for Box<dyn EchoTimer> {
    fn trigger_and_measure(&mut self, timeout: Duration) -> Result<Option<Duration>> {
        (**self).trigger_and_measure(timeout)
    }
}

/// Convert an echo round-trip time to centimeters, rounding half-up
///
/// `cm = round(us * 343 / 20000)`: the echo travels the distance twice at
/// 343 m/s. Readings outside the plausible window are treated as no-reading.
pub fn round_trip_to_cm(round_trip: Duration) -> Option<u16> {
    let us = round_trip.as_micros() as u64;
    let cm = (us * SPEED_OF_SOUND_M_S + 10_000) / 20_000;
    if (MIN_PLAUSIBLE_CM..=MAX_PLAUSIBLE_CM).contains(&cm) {
        Some(cm as u16)
    } else {
        None
    }
}

/// Retrying sampler over an [`EchoTimer`]
pub struct RangeSampler<T: EchoTimer> {
    timer: T,
}

impl<T: EchoTimer> RangeSampler<T> {
    pub fn new(timer: T) -> Self {
        Self { timer }
    }

    /// One trigger/measure attempt, converted to centimeters
    pub fn attempt(&mut self) -> Result<Option<u16>> {
        Ok(self
            .timer
            .trigger_and_measure(ECHO_TIMEOUT)?
            .and_then(round_trip_to_cm))
    }

    /// One full sampling cycle: up to [`MAX_ATTEMPTS`] attempts with a
    /// [`SETTLE_PAUSE`] between them, stopping at the first valid reading.
    ///
    /// All attempts timing out yields `Ok(None)` - the cycle still produces
    /// exactly one transmitted record.
    pub fn sample(&mut self) -> Result<Option<u16>> {
        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                thread::sleep(SETTLE_PAUSE);
            }
            if let Some(cm) = self.attempt()? {
                return Ok(Some(cm));
            }
            log::debug!("ranging attempt {} timed out", attempt + 1);
        }
        Ok(None)
    }
}
