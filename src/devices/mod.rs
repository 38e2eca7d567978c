//! Device backends
//!
//! The rangefinder and the alert output sit behind the [`EchoTimer`] and
//! [`AlertActuator`] traits; this module picks a backend from the `[device]`
//! config section. The `sim` backend runs the whole pipeline hardware-free.

use crate::config::DeviceConfig;
use crate::error::{Error, Result};
use crate::ranging::EchoTimer;
use crate::receiver::AlertActuator;

pub mod sim;

pub use sim::{LogActuator, SimulatedEcho};

/// Create the rangefinder backend named by the config
pub fn create_echo_timer(config: &DeviceConfig) -> Result<Box<dyn EchoTimer>> {
    match config.kind.as_str() {
        "sim" => Ok(Box::new(SimulatedEcho::new(
            config.sim_target_cm,
            config.sim_noise_cm,
            config.sim_dropout,
        )?)),
        other => Err(Error::InvalidParameter(format!(
            "unknown device kind: {other}"
        ))),
    }
}

/// Create the alert actuator backend named by the config
pub fn create_actuator(config: &DeviceConfig) -> Result<Box<dyn AlertActuator>> {
    match config.kind.as_str() {
        "sim" => Ok(Box::new(LogActuator::new())),
        other => Err(Error::InvalidParameter(format!(
            "unknown device kind: {other}"
        ))),
    }
}
