//! Receiver state aggregation and status query surface
//!
//! Two execution contexts touch the receiver's state: the inbound-datagram
//! handler (driven by the link layer at unpredictable times) and the status
//! query path (driven by external polling). Both go through one
//! `parking_lot::Mutex` around the small [`Snapshot`] triple, so a reader
//! can never observe a half-updated snapshot. The actuator pulse happens
//! after the lock is released - it has no effect on the snapshot, and the
//! query path must not wait out a 300 ms pulse.

use crate::clock::MonotonicClock;
use crate::error::Result;
use crate::record::DetectionRecord;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Fixed alert output activation per detection event
pub const ACTUATOR_PULSE: Duration = Duration::from_millis(300);

/// Current aggregate detection state, exposed to polling consumers
///
/// `last_update_ms` is the receiver's own monotonic clock at the moment the
/// most recent record was processed (every valid record updates it, detected
/// or not). It is returned to queries unchanged; any calendar-time
/// interpretation is the consumer's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    /// Whether the most recently processed record reported a detection
    pub detected: bool,
    /// Receiver-local monotonic ms of the last processed record
    pub last_update_ms: u32,
    /// Detection events counted, one per detecting record
    pub detect_count: u32,
}

/// Physical alert output
pub trait AlertActuator: Send {
    /// Drive the output high for `duration`, then low
    fn pulse(&mut self, duration: Duration) -> Result<()>;
}

impl AlertActuator for Box<dyn AlertActuator> {
    fn pulse(&mut self, duration: Duration) -> Result<()> {
        (**self).pulse(duration)
    }
}

/// Consumes inbound records, maintains the snapshot, fires the actuator
pub struct Aggregator<A: AlertActuator> {
    state: Mutex<Snapshot>,
    actuator: Mutex<A>,
    clock: MonotonicClock,
    received: AtomicU64,
    discarded: AtomicU64,
}

impl<A: AlertActuator> Aggregator<A> {
    pub fn new(actuator: A, clock: MonotonicClock) -> Self {
        Self {
            state: Mutex::new(Snapshot::default()),
            actuator: Mutex::new(actuator),
            clock,
            received: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Process one inbound datagram payload
    ///
    /// Truncated or malformed payloads are discarded without touching the
    /// snapshot. A valid record always refreshes `last_update_ms` and
    /// `detected`; `detect_count` increments once per record that reports a
    /// detection, and only such a record pulses the actuator.
    pub fn handle_datagram(&self, payload: &[u8]) {
        let record = match DetectionRecord::decode(payload) {
            Ok(record) => record,
            Err(e) => {
                self.discarded.fetch_add(1, Ordering::Relaxed);
                log::debug!("discarded inbound datagram: {e}");
                return;
            }
        };
        self.received.fetch_add(1, Ordering::Relaxed);

        let now = self.clock.now_ms();
        {
            let mut snap = self.state.lock();
            snap.last_update_ms = now;
            snap.detected = record.detected;
            if record.detected {
                snap.detect_count = snap.detect_count.wrapping_add(1);
            }
        }

        log::debug!(
            "record from {} seq={} distance={:?}cm detected={}",
            record.sender,
            record.sequence,
            record.distance_cm,
            record.detected
        );

        if record.detected {
            // Snapshot is already committed; queries proceed during the pulse.
            if let Err(e) = self.actuator.lock().pulse(ACTUATOR_PULSE) {
                log::warn!("alert actuator pulse failed: {e}");
            }
        }
    }

    /// Pure read of the current snapshot, safe at arbitrary frequency
    pub fn read_snapshot(&self) -> Snapshot {
        *self.state.lock()
    }

    /// Link-level counters for the periodic stats log
    pub fn stats(&self) -> (u64, u64) {
        (
            self.received.load(Ordering::Relaxed),
            self.discarded.load(Ordering::Relaxed),
        )
    }
}
