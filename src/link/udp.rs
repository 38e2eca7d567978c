//! UDP datagram radio
//!
//! The channel-lock contract is realised through the port mapping: both
//! nodes bind `base_port + channel`, so two nodes configured with different
//! channel numbers simply never exchange datagrams - the same failure mode
//! as mismatched radio channels, a silent miss rather than an error.

use super::{PeerTable, RadioLink};
use crate::error::{Error, Result};
use crate::record::NodeId;
use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::time::Duration;

/// Receive poll interval; bounds how long a shutdown request can go unseen
const RECV_POLL: Duration = Duration::from_millis(200);

/// Channel-locked UDP link
pub struct UdpRadio {
    socket: UdpSocket,
    peers: PeerTable,
    /// Shared channel-derived port, also used for peer addresses
    port: u16,
}

impl UdpRadio {
    /// Bind the radio to its channel-derived port
    ///
    /// A bind failure is fatal: the node has no way to operate without its
    /// radio, so this error should halt startup rather than be retried
    /// half-initialized.
    pub fn bind(bind_ip: IpAddr, base_port: u16, channel: u8) -> Result<Self> {
        let port = base_port
            .checked_add(channel as u16)
            .ok_or_else(|| Error::InvalidParameter(format!("channel {channel} overflows port")))?;

        let socket = UdpSocket::bind(SocketAddr::new(bind_ip, port))
            .map_err(|e| Error::RadioInit(format!("bind {bind_ip}:{port}: {e}")))?;
        socket
            .set_read_timeout(Some(RECV_POLL))
            .map_err(|e| Error::RadioInit(format!("set read timeout: {e}")))?;

        log::info!("radio locked to channel {channel} (udp port {port})");

        Ok(Self {
            socket,
            peers: PeerTable::new(),
            port,
        })
    }

    /// Register a peer reachable at `ip` on this radio's channel
    ///
    /// Registering [`NodeId::BROADCAST`] enables broadcast sends on the
    /// socket so undelivered unicast records could fall back to broadcast.
    pub fn register_peer(&mut self, id: NodeId, ip: IpAddr) -> Result<()> {
        if id == NodeId::BROADCAST {
            self.socket
                .set_broadcast(true)
                .map_err(|e| Error::PeerRegistration(format!("enable broadcast: {e}")))?;
        }
        self.peers.register(id, SocketAddr::new(ip, self.port))?;
        log::info!("registered peer {id} at {ip} (channel port {})", self.port);
        Ok(())
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }
}

impl RadioLink for UdpRadio {
    fn send_to(&self, peer: &NodeId, payload: &[u8]) -> Result<()> {
        let addr = self
            .peers
            .lookup(peer)
            .ok_or_else(|| Error::InvalidParameter(format!("unknown peer {peer}")))?;

        let sent = self.socket.send_to(payload, addr)?;
        if sent != payload.len() {
            return Err(Error::Other(format!(
                "short send to {peer}: {sent} of {} bytes",
                payload.len()
            )));
        }
        Ok(())
    }

    fn recv(&self, buf: &mut [u8]) -> Result<Option<usize>> {
        match self.socket.recv_from(buf) {
            Ok((len, _src)) => Ok(Some(len)),
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                Ok(None)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}
