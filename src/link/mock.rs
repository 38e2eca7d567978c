//! In-memory radio link for testing
//!
//! A pair of endpoints wired back-to-back over channels, with switchable
//! send failure to exercise the non-fatal per-send error path.

use super::RadioLink;
use crate::error::{Error, Result};
use crate::record::NodeId;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Poll interval for the mock receive path
const RECV_POLL: Duration = Duration::from_millis(10);

/// One endpoint of an in-memory link pair
pub struct MockRadio {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    fail_sends: Arc<AtomicBool>,
}

impl MockRadio {
    /// Create two endpoints wired to each other
    pub fn pair() -> (MockRadio, MockRadio) {
        let (a_tx, a_rx) = unbounded();
        let (b_tx, b_rx) = unbounded();
        (
            MockRadio {
                tx: b_tx,
                rx: a_rx,
                fail_sends: Arc::new(AtomicBool::new(false)),
            },
            MockRadio {
                tx: a_tx,
                rx: b_rx,
                fail_sends: Arc::new(AtomicBool::new(false)),
            },
        )
    }

    /// Make subsequent sends from this endpoint fail
    pub fn set_send_failure(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::Relaxed);
    }
}

impl RadioLink for MockRadio {
    fn send_to(&self, peer: &NodeId, payload: &[u8]) -> Result<()> {
        if self.fail_sends.load(Ordering::Relaxed) {
            return Err(Error::Other(format!("simulated send failure to {peer}")));
        }
        self.tx
            .send(payload.to_vec())
            .map_err(|_| Error::Other(format!("peer {peer} gone")))
    }

    fn recv(&self, buf: &mut [u8]) -> Result<Option<usize>> {
        match self.rx.recv_timeout(RECV_POLL) {
            Ok(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(Some(len))
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> NodeId {
        NodeId([1, 2, 3, 4, 5, 6])
    }

    #[test]
    fn test_pair_delivers_datagrams() {
        let (a, b) = MockRadio::pair();
        a.send_to(&peer(), &[1, 2, 3]).unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(b.recv(&mut buf).unwrap(), Some(3));
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_send_failure_switch() {
        let (a, b) = MockRadio::pair();
        a.set_send_failure(true);
        assert!(a.send_to(&peer(), &[0]).is_err());

        a.set_send_failure(false);
        a.send_to(&peer(), &[7]).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(b.recv(&mut buf).unwrap(), Some(1));
    }

    #[test]
    fn test_recv_times_out_empty() {
        let (a, _b) = MockRadio::pair();
        let mut buf = [0u8; 4];
        assert_eq!(a.recv(&mut buf).unwrap(), None);
    }
}
