//! Simulated rangefinder and actuator
//!
//! Models an ultrasonic sensor watching a target at a configurable distance:
//! Gaussian range noise plus an occasional missed echo, so the retry and
//! no-reading paths get exercised without hardware.

use crate::error::{Error, Result};
use crate::ranging::EchoTimer;
use crate::receiver::AlertActuator;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::thread;
use std::time::Duration;

/// Simulated echo timer with Gaussian range noise and echo dropout
pub struct SimulatedEcho {
    rng: StdRng,
    noise: Normal<f64>,
    target_cm: f64,
    dropout: f64,
}

impl SimulatedEcho {
    pub fn new(target_cm: f64, noise_cm: f64, dropout: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&dropout) {
            return Err(Error::InvalidParameter(format!(
                "sim_dropout must be a probability, got {dropout}"
            )));
        }
        let noise = Normal::new(0.0, noise_cm.max(0.0))
            .map_err(|e| Error::InvalidParameter(format!("sim noise: {e}")))?;
        Ok(Self {
            rng: StdRng::from_entropy(),
            noise,
            target_cm,
            dropout,
        })
    }
}

impl EchoTimer for SimulatedEcho {
    fn trigger_and_measure(&mut self, timeout: Duration) -> Result<Option<Duration>> {
        if self.rng.gen::<f64>() < self.dropout {
            return Ok(None);
        }

        let cm = (self.target_cm + self.noise.sample(&mut self.rng)).max(1.0);
        let round_trip = Duration::from_micros((cm * 20_000.0 / 343.0) as u64);
        if round_trip > timeout {
            // Echo from beyond the measurement window: the real sensor
            // would time out waiting for it.
            return Ok(None);
        }
        Ok(Some(round_trip))
    }
}

/// Actuator that logs instead of driving a pin, holding for the pulse width
pub struct LogActuator {
    activations: u64,
}

impl LogActuator {
    pub fn new() -> Self {
        Self { activations: 0 }
    }
}

impl Default for LogActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertActuator for LogActuator {
    fn pulse(&mut self, duration: Duration) -> Result<()> {
        self.activations += 1;
        log::info!(
            "ALERT pulse #{} ({} ms)",
            self.activations,
            duration.as_millis()
        );
        thread::sleep(duration);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranging::ECHO_TIMEOUT;

    #[test]
    fn test_sim_produces_readings_near_target() {
        let mut echo = SimulatedEcho::new(100.0, 2.0, 0.0).unwrap();
        for _ in 0..50 {
            let round_trip = echo.trigger_and_measure(ECHO_TIMEOUT).unwrap().unwrap();
            let cm = crate::ranging::round_trip_to_cm(round_trip).unwrap();
            assert!((80..=120).contains(&cm), "reading {cm} far from target");
        }
    }

    #[test]
    fn test_full_dropout_never_echoes() {
        let mut echo = SimulatedEcho::new(100.0, 2.0, 1.0).unwrap();
        for _ in 0..10 {
            assert!(echo.trigger_and_measure(ECHO_TIMEOUT).unwrap().is_none());
        }
    }

    #[test]
    fn test_target_beyond_window_times_out() {
        // 600cm needs a ~35ms round trip, past the 30ms bound
        let mut echo = SimulatedEcho::new(600.0, 0.0, 0.0).unwrap();
        assert!(echo.trigger_and_measure(ECHO_TIMEOUT).unwrap().is_none());
    }

    #[test]
    fn test_dropout_validation() {
        assert!(SimulatedEcho::new(100.0, 2.0, 1.5).is_err());
    }
}
