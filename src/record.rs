//! Detection record wire codec
//!
//! This module defines the fixed 17-byte record exchanged between the two
//! nodes and its hand-written byte layout:
//!
//! ```text
//! ┌───────────┬──────────────┬────────────────┬──────────────┬───────────────┐
//! │ sender[6] │ sequence u32 │ distance_cm u16│ detected u8  │ timestamp u32 │
//! │ bytes 0-5 │ bytes 6-9 LE │ bytes 10-11 LE │ byte 12      │ bytes 13-16 LE│
//! └───────────┴──────────────┴────────────────┴──────────────┴───────────────┘
//! ```
//!
//! The layout is the wire contract between independently-flashed nodes: both
//! ends must agree on size and field order, so the codec is explicit byte
//! manipulation rather than struct packing or a schema-driven serializer.
//! A `distance_cm` of zero is the on-wire sentinel for "no valid reading";
//! in-process the distance is an `Option<u16>` and the sentinel exists only
//! inside the encoded bytes.

use crate::error::{Error, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Fixed encoded record size in bytes
pub const RECORD_SIZE: usize = 17;

/// Hardware-address-style node identifier (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub [u8; 6]);

impl NodeId {
    /// Broadcast identifier (all bits set)
    pub const BROADCAST: NodeId = NodeId([0xFF; 6]);

    /// Raw bytes of the identifier
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for NodeId {
    type Err = Error;

    /// Parse colon-separated hex form, e.g. `24:6f:28:ae:52:7c`
    fn from_str(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for slot in bytes.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| Error::InvalidParameter(format!("node id too short: {s}")))?;
            *slot = u8::from_str_radix(part, 16)
                .map_err(|_| Error::InvalidParameter(format!("bad node id octet: {part}")))?;
        }
        if parts.next().is_some() {
            return Err(Error::InvalidParameter(format!("node id too long: {s}")));
        }
        Ok(NodeId(bytes))
    }
}

// Config files carry node ids in colon-hex string form.
impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// One sampling cycle's detection result, as exchanged on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionRecord {
    /// Origin node identifier
    pub sender: NodeId,
    /// Monotonically increasing per-sender counter, wraps at 2^32
    pub sequence: u32,
    /// Validated distance in centimeters; `None` = no echo after retries
    pub distance_cm: Option<u16>,
    /// Whether the reading fell inside the alert range
    pub detected: bool,
    /// Sender-local monotonic milliseconds at send time (no shared epoch)
    pub timestamp_ms: u32,
}

impl DetectionRecord {
    /// Encode into the fixed 17-byte wire layout
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[0..6].copy_from_slice(&self.sender.0);
        buf[6..10].copy_from_slice(&self.sequence.to_le_bytes());
        buf[10..12].copy_from_slice(&self.distance_cm.unwrap_or(0).to_le_bytes());
        buf[12] = self.detected as u8;
        buf[13..17].copy_from_slice(&self.timestamp_ms.to_le_bytes());
        buf
    }

    /// Decode from a received datagram payload
    ///
    /// Payloads shorter than [`RECORD_SIZE`] are rejected; trailing bytes
    /// beyond the record are ignored. A zero distance field decodes to
    /// `None`, and `detected` is cleared in that case: an alert cannot
    /// be paired with a failed reading, whatever the bytes claim.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < RECORD_SIZE {
            return Err(Error::InvalidRecord(format!(
                "datagram too short: {} bytes, need {}",
                payload.len(),
                RECORD_SIZE
            )));
        }

        let mut sender = [0u8; 6];
        sender.copy_from_slice(&payload[0..6]);

        let sequence = u32::from_le_bytes([payload[6], payload[7], payload[8], payload[9]]);
        let raw_distance = u16::from_le_bytes([payload[10], payload[11]]);
        let distance_cm = if raw_distance == 0 {
            None
        } else {
            Some(raw_distance)
        };
        let detected = payload[12] != 0 && distance_cm.is_some();
        let timestamp_ms =
            u32::from_le_bytes([payload[13], payload[14], payload[15], payload[16]]);

        Ok(Self {
            sender: NodeId(sender),
            sequence,
            distance_cm,
            detected,
            timestamp_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> NodeId {
        "24:6f:28:ae:52:7c".parse().unwrap()
    }

    #[test]
    fn test_encode_layout() {
        let record = DetectionRecord {
            sender: sender(),
            sequence: 0x0403_0201,
            distance_cm: Some(45),
            detected: true,
            timestamp_ms: 0x0807_0605,
        };
        let bytes = record.encode();

        assert_eq!(bytes.len(), RECORD_SIZE);
        assert_eq!(&bytes[0..6], &[0x24, 0x6f, 0x28, 0xae, 0x52, 0x7c]);
        assert_eq!(&bytes[6..10], &[0x01, 0x02, 0x03, 0x04]); // sequence LE
        assert_eq!(&bytes[10..12], &[45, 0]); // distance LE
        assert_eq!(bytes[12], 1); // detected
        assert_eq!(&bytes[13..17], &[0x05, 0x06, 0x07, 0x08]); // timestamp LE
    }

    #[test]
    fn test_roundtrip() {
        let record = DetectionRecord {
            sender: sender(),
            sequence: u32::MAX,
            distance_cm: Some(80),
            detected: true,
            timestamp_ms: 123_456,
        };
        let decoded = DetectionRecord::decode(&record.encode()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_no_reading_encodes_as_zero() {
        let record = DetectionRecord {
            sender: sender(),
            sequence: 7,
            distance_cm: None,
            detected: false,
            timestamp_ms: 1000,
        };
        let bytes = record.encode();
        assert_eq!(&bytes[10..12], &[0, 0]);

        let decoded = DetectionRecord::decode(&bytes).unwrap();
        assert_eq!(decoded.distance_cm, None);
        assert!(!decoded.detected);
    }

    #[test]
    fn test_decode_clears_detected_on_sentinel() {
        // A record claiming detected=1 with distance=0 is contradictory;
        // decode must normalise it to not-detected.
        let mut bytes = DetectionRecord {
            sender: sender(),
            sequence: 1,
            distance_cm: None,
            detected: false,
            timestamp_ms: 0,
        }
        .encode();
        bytes[12] = 1;

        let decoded = DetectionRecord::decode(&bytes).unwrap();
        assert!(!decoded.detected);
    }

    #[test]
    fn test_decode_rejects_short_payload() {
        let bytes = [0u8; RECORD_SIZE - 1];
        assert!(DetectionRecord::decode(&bytes).is_err());
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let record = DetectionRecord {
            sender: sender(),
            sequence: 2,
            distance_cm: Some(120),
            detected: false,
            timestamp_ms: 5,
        };
        let mut bytes = record.encode().to_vec();
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        assert_eq!(DetectionRecord::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn test_node_id_parse_and_display() {
        let id: NodeId = "a0:b1:c2:d3:e4:f5".parse().unwrap();
        assert_eq!(id.to_string(), "a0:b1:c2:d3:e4:f5");

        assert!("a0:b1:c2".parse::<NodeId>().is_err());
        assert!("a0:b1:c2:d3:e4:f5:00".parse::<NodeId>().is_err());
        assert!("zz:b1:c2:d3:e4:f5".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_broadcast_id() {
        assert_eq!(NodeId::BROADCAST.to_string(), "ff:ff:ff:ff:ff:ff");
    }
}
