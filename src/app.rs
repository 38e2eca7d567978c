//! Node orchestration
//!
//! Wires config, devices, and the radio into one of the two roles. The
//! sender is strictly single-threaded: the transmit loop owns the main
//! thread. The receiver runs the inbound-datagram handler on a worker
//! thread and keeps the main thread for the periodic status log, which
//! polls the same query surface the external HTTP layer would.

use crate::clock::MonotonicClock;
use crate::config::{Config, Role};
use crate::devices::{create_actuator, create_echo_timer};
use crate::error::{Error, Result};
use crate::link::{RadioLink, UdpRadio};
use crate::ranging::RangeSampler;
use crate::receiver::Aggregator;
use crate::record::{NodeId, RECORD_SIZE};
use crate::sender::TransmitLoop;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Interval between receiver status log lines
const STATS_INTERVAL: Duration = Duration::from_secs(10);

/// One configured node, either role
pub struct App {
    config: Config,
    running: Arc<AtomicBool>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Run the node until a shutdown signal arrives
    pub fn run(&mut self) -> Result<()> {
        let r = Arc::clone(&self.running);
        ctrlc::set_handler(move || {
            log::info!("Received shutdown signal");
            r.store(false, Ordering::Relaxed);
        })
        .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {e}")))?;

        log::info!(
            "Node {} starting as {:?} on channel {}",
            self.config.node.id,
            self.config.node.role,
            self.config.radio.channel
        );

        match self.config.node.role {
            Role::Sender => self.run_sender(),
            Role::Receiver => self.run_receiver(),
        }
    }

    fn bind_radio(&self) -> Result<UdpRadio> {
        let bind_ip: IpAddr = self
            .config
            .radio
            .bind_address
            .parse()
            .map_err(|e| Error::Config(format!("bind_address: {e}")))?;
        // A radio that cannot bind is fatal: fail-stop, never half-initialized.
        UdpRadio::bind(bind_ip, self.config.radio.base_port, self.config.radio.channel)
    }

    fn run_sender(&self) -> Result<()> {
        let mut radio = self.bind_radio()?;

        // validate() guarantees these on the sender role
        let peer_id = self
            .config
            .radio
            .peer_id
            .ok_or_else(|| Error::Config("missing radio.peer_id".to_string()))?;
        let peer_ip: IpAddr = self
            .config
            .radio
            .peer_address
            .as_deref()
            .ok_or_else(|| Error::Config("missing radio.peer_address".to_string()))?
            .parse()
            .map_err(|e| Error::Config(format!("peer_address: {e}")))?;

        // Registration trouble is not fatal: every send to an unknown peer
        // fails and gets reported individually instead.
        if let Err(e) = radio.register_peer(peer_id, peer_ip) {
            log::error!("receiver peer registration failed: {e}");
        }
        if self.config.radio.register_broadcast {
            // Broadcast fallback is best-effort; a failure here only costs
            // the fallback path, so log and carry on.
            if let Err(e) = radio.register_peer(NodeId::BROADCAST, peer_ip) {
                log::warn!("broadcast peer registration failed: {e}");
            }
        }

        log::info!("link ready with {} registered peer(s)", radio.peer_count());

        let echo = create_echo_timer(&self.config.device)?;
        let mut tx = TransmitLoop::new(
            RangeSampler::new(echo),
            radio,
            self.config.node.id,
            peer_id,
            self.config.detection.alert_threshold_cm,
            Duration::from_millis(self.config.detection.sample_period_ms),
        );

        // The sender is single-threaded by design: ranging and sending block
        // this loop and nothing else needs to run.
        tx.run(&self.running);
        Ok(())
    }

    fn run_receiver(&self) -> Result<()> {
        let radio = self.bind_radio()?;
        let actuator = create_actuator(&self.config.device)?;
        let aggregator = Arc::new(Aggregator::new(actuator, MonotonicClock::new()));

        let handler_agg = Arc::clone(&aggregator);
        let handler_running = Arc::clone(&self.running);
        let handle = thread::Builder::new()
            .name("radio-recv".to_string())
            .spawn(move || {
                let mut buf = [0u8; RECORD_SIZE + 16];
                while handler_running.load(Ordering::Relaxed) {
                    match radio.recv(&mut buf) {
                        Ok(Some(len)) => handler_agg.handle_datagram(&buf[..len]),
                        Ok(None) => {} // poll timeout, re-check running flag
                        Err(e) => log::warn!("radio receive error: {e}"),
                    }
                }
                log::debug!("radio-recv thread exiting");
            })?;

        log::info!("Receiver running. Press Ctrl-C to stop.");

        let mut last_stats = Instant::now();
        while self.running.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(100));

            if last_stats.elapsed() >= STATS_INTERVAL {
                let snap = aggregator.read_snapshot();
                let (received, discarded) = aggregator.stats();
                log::info!(
                    "status: detected={} last_update={}ms events={} (records: {} ok, {} discarded)",
                    snap.detected,
                    snap.last_update_ms,
                    snap.detect_count,
                    received,
                    discarded
                );
                last_stats = Instant::now();
            }
        }

        log::info!("Shutting down...");
        handle
            .join()
            .map_err(|_| Error::Other("radio-recv thread panicked".to_string()))?;
        Ok(())
    }
}
