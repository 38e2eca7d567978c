//! Channel-locked radio link layer
//!
//! The two nodes exchange bare datagrams over a point-to-point link. The
//! only framing is the transport's own datagram boundary; the payload is the
//! 17-byte detection record. Delivery requires both nodes to lock their
//! radios to the identical pre-agreed channel number - there is no channel
//! discovery at runtime.
//!
//! Peers are registered once at startup and the peer set is immutable
//! afterwards. Registering an already-known peer is success, not an error.

use crate::error::{Error, Result};
use crate::record::NodeId;
use std::collections::HashMap;
use std::net::SocketAddr;

mod mock;
mod udp;

pub use mock::MockRadio;
pub use udp::UdpRadio;

/// Point-to-point datagram link between the two nodes
pub trait RadioLink: Send {
    /// Send a datagram to a registered peer
    fn send_to(&self, peer: &NodeId, payload: &[u8]) -> Result<()>;

    /// Receive the next inbound datagram into `buf`
    ///
    /// Returns `Ok(None)` when no datagram arrived within the link's poll
    /// interval, so callers can check their shutdown flag between waits.
    fn recv(&self, buf: &mut [u8]) -> Result<Option<usize>>;
}

/// Known peers, fixed after startup
#[derive(Debug, Default)]
pub struct PeerTable {
    peers: HashMap<NodeId, SocketAddr>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self {
            peers: HashMap::new(),
        }
    }

    /// Register a peer address; idempotent for an identical re-registration
    pub fn register(&mut self, id: NodeId, addr: SocketAddr) -> Result<()> {
        match self.peers.get(&id) {
            Some(existing) if *existing == addr => Ok(()),
            Some(existing) => Err(Error::PeerRegistration(format!(
                "peer {id} already registered at {existing}, refusing {addr}"
            ))),
            None => {
                self.peers.insert(id, addr);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, id: &NodeId) -> Option<SocketAddr> {
        self.peers.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer_id() -> NodeId {
        "10:20:30:40:50:60".parse().unwrap()
    }

    fn addr(port: u16) -> SocketAddr {
        format!("192.168.4.1:{port}").parse().unwrap()
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut table = PeerTable::new();
        table.register(peer_id(), addr(47606)).unwrap();
        // Same peer, same address: success, not an error
        table.register(peer_id(), addr(47606)).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_register_conflicting_address_fails() {
        let mut table = PeerTable::new();
        table.register(peer_id(), addr(47606)).unwrap();
        assert!(table.register(peer_id(), addr(47607)).is_err());
        // Original registration is untouched
        assert_eq!(table.lookup(&peer_id()), Some(addr(47606)));
    }

    #[test]
    fn test_lookup_unknown_peer() {
        let table = PeerTable::new();
        assert_eq!(table.lookup(&peer_id()), None);
        assert!(table.is_empty());
    }
}
