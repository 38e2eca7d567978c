//! UltraSentry - two-node wireless presence detection pipeline
//!
//! A sensing node periodically measures distance with an ultrasonic
//! rangefinder and transmits a fixed-layout detection record over a
//! channel-locked datagram link; a receiving node aggregates inbound
//! records into a consistent snapshot, drives an alert actuator, and
//! exposes the current status to polling consumers.

pub mod app;
pub mod clock;
pub mod config;
pub mod devices;
pub mod error;
pub mod link;
pub mod ranging;
pub mod receiver;
pub mod record;
pub mod sender;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use receiver::Snapshot;
pub use record::{DetectionRecord, NodeId, RECORD_SIZE};
