//! Sender transmit loop
//!
//! A fixed-period, single-threaded loop: sample the rangefinder (with its
//! internal retry), classify the reading against the alert threshold, stamp
//! sequence number and local time, and hand the encoded record to the link.
//! The ranging and the send both block the loop, which is fine - nothing
//! else runs on the sender.
//!
//! A failed send is reported and forgotten; the next cycle's fresh sample
//! supersedes it. The sequence number is consumed exactly once per composed
//! record, send outcome notwithstanding, so gaps on the receiver side always
//! mean drops.

use crate::clock::MonotonicClock;
use crate::link::RadioLink;
use crate::ranging::{EchoTimer, RangeSampler};
use crate::record::{DetectionRecord, NodeId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Periodic detection-record transmitter
pub struct TransmitLoop<T: EchoTimer, L: RadioLink> {
    sampler: RangeSampler<T>,
    link: L,
    node_id: NodeId,
    receiver_peer: NodeId,
    alert_threshold_cm: u16,
    period: Duration,
    clock: MonotonicClock,
    sequence: u32,
}

impl<T: EchoTimer, L: RadioLink> TransmitLoop<T, L> {
    pub fn new(
        sampler: RangeSampler<T>,
        link: L,
        node_id: NodeId,
        receiver_peer: NodeId,
        alert_threshold_cm: u16,
        period: Duration,
    ) -> Self {
        Self {
            sampler,
            link,
            node_id,
            receiver_peer,
            alert_threshold_cm,
            period,
            clock: MonotonicClock::new(),
            sequence: 0,
        }
    }

    /// The underlying link (tests inspect and fault it)
    pub fn link(&self) -> &L {
        &self.link
    }

    /// One sampling cycle: sample, compose, send
    ///
    /// Returns the composed record. Sampling hardware faults degrade to a
    /// no-reading record and send failures are logged; neither stops the
    /// loop or rewinds the sequence counter.
    pub fn cycle(&mut self) -> DetectionRecord {
        let reading = match self.sampler.sample() {
            Ok(reading) => reading,
            Err(e) => {
                log::warn!("ranging failed: {e}");
                None
            }
        };

        let detected = matches!(reading, Some(cm) if cm <= self.alert_threshold_cm);
        let record = DetectionRecord {
            sender: self.node_id,
            sequence: self.sequence,
            distance_cm: reading,
            detected,
            timestamp_ms: self.clock.now_ms(),
        };
        self.sequence = self.sequence.wrapping_add(1);

        if let Err(e) = self.link.send_to(&self.receiver_peer, &record.encode()) {
            log::warn!("send of record seq={} failed: {e}", record.sequence);
        }
        record
    }

    /// Run cycles until `running` is cleared
    pub fn run(&mut self, running: &AtomicBool) {
        log::info!(
            "transmit loop started: peer={} period={}ms threshold={}cm",
            self.receiver_peer,
            self.period.as_millis(),
            self.alert_threshold_cm
        );

        while running.load(Ordering::Relaxed) {
            let record = self.cycle();
            log::debug!(
                "sent seq={} distance={:?}cm detected={}",
                record.sequence,
                record.distance_cm,
                record.detected
            );
            thread::sleep(self.period);
        }

        log::info!("transmit loop stopped after {} records", self.sequence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::link::MockRadio;

    /// Echo timer that always reports the same distance (or nothing)
    struct FixedEcho {
        cm: Option<u64>,
    }

    impl EchoTimer for FixedEcho {
        fn trigger_and_measure(&mut self, _timeout: Duration) -> Result<Option<Duration>> {
            Ok(self.cm.map(|cm| Duration::from_micros(cm * 20_000 / 343)))
        }
    }

    fn node(byte: u8) -> NodeId {
        NodeId([byte; 6])
    }

    fn transmit_loop(cm: Option<u64>, link: MockRadio) -> TransmitLoop<FixedEcho, MockRadio> {
        TransmitLoop::new(
            RangeSampler::new(FixedEcho { cm }),
            link,
            node(0xAA),
            node(0xBB),
            80,
            Duration::from_millis(700),
        )
    }

    #[test]
    fn test_detection_rule_at_threshold() {
        let (link, _peer) = MockRadio::pair();
        let mut tx = transmit_loop(Some(80), link);
        assert!(tx.cycle().detected);

        let (link, _peer) = MockRadio::pair();
        let mut tx = transmit_loop(Some(81), link);
        assert!(!tx.cycle().detected);
    }

    #[test]
    fn test_close_reading_detects() {
        let (link, peer) = MockRadio::pair();
        let mut tx = transmit_loop(Some(45), link);
        let record = tx.cycle();

        assert_eq!(record.distance_cm, Some(45));
        assert!(record.detected);

        // Record actually went out on the link
        let mut buf = [0u8; 32];
        assert_eq!(peer.recv(&mut buf).unwrap(), Some(17));
    }

    #[test]
    fn test_no_reading_never_detects() {
        let (link, _peer) = MockRadio::pair();
        let mut tx = transmit_loop(None, link);
        let record = tx.cycle();

        assert_eq!(record.distance_cm, None);
        assert!(!record.detected);
    }

    #[test]
    fn test_sequence_survives_send_failures() {
        let (link, peer) = MockRadio::pair();
        let mut tx = transmit_loop(Some(45), link);

        assert_eq!(tx.cycle().sequence, 0);
        tx.link.set_send_failure(true);
        assert_eq!(tx.cycle().sequence, 1);
        assert_eq!(tx.cycle().sequence, 2);
        tx.link.set_send_failure(false);
        assert_eq!(tx.cycle().sequence, 3);

        // Only the two successful sends reached the peer, with a gap between
        let mut buf = [0u8; 32];
        let n = peer.recv(&mut buf).unwrap().unwrap();
        let first = DetectionRecord::decode(&buf[..n]).unwrap();
        let n = peer.recv(&mut buf).unwrap().unwrap();
        let second = DetectionRecord::decode(&buf[..n]).unwrap();
        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 3);
        assert_eq!(peer.recv(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_sequence_wraps() {
        let (link, _peer) = MockRadio::pair();
        let mut tx = transmit_loop(Some(45), link);
        tx.sequence = u32::MAX;
        assert_eq!(tx.cycle().sequence, u32::MAX);
        assert_eq!(tx.cycle().sequence, 0);
    }
}
