//! Configuration for UltraSentry nodes
//!
//! Both nodes load the same TOML shape; the `[node] role` field selects
//! whether this flash acts as the sensing sender or the alerting receiver.
//! The radio section is the shared contract: channel number and peer
//! identities must agree between the two nodes or no records flow.

use crate::error::{Error, Result};
use crate::record::NodeId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level node configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub node: NodeConfig,
    pub radio: RadioConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    pub device: DeviceConfig,
}

/// Which half of the pipeline this node runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Sender,
    Receiver,
}

/// Node identity
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
    pub role: Role,
    /// This node's own identifier, colon-hex form
    pub id: NodeId,
}

/// Radio link configuration, fixed for the process lifetime
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RadioConfig {
    /// Pre-agreed channel number; must be identical on both nodes
    pub channel: u8,
    /// Base UDP port the channel number offsets
    pub base_port: u16,
    /// Local bind address
    pub bind_address: String,
    /// Intended receiver's identifier (required on the sender)
    pub peer_id: Option<NodeId>,
    /// Intended receiver's network address (required on the sender)
    pub peer_address: Option<String>,
    /// Also register the broadcast fallback peer
    #[serde(default)]
    pub register_broadcast: bool,
}

/// Detection tuning; defaults match the deployed installation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionConfig {
    /// Maximum distance classified as "detected", cm
    pub alert_threshold_cm: u16,
    /// Delay between transmit cycles, ms
    pub sample_period_ms: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            alert_threshold_cm: 80,
            sample_period_ms: 700,
        }
    }
}

/// Sensor / actuator backend selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Backend kind; `sim` runs hardware-free
    pub kind: String,
    /// Simulated true distance, cm
    #[serde(default = "default_sim_target")]
    pub sim_target_cm: f64,
    /// Simulated range noise standard deviation, cm
    #[serde(default = "default_sim_noise")]
    pub sim_noise_cm: f64,
    /// Probability of a simulated echo timeout per attempt
    #[serde(default)]
    pub sim_dropout: f64,
}

fn default_sim_target() -> f64 {
    120.0
}

fn default_sim_noise() -> f64 {
    3.0
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("read {}: {e}", path.as_ref().display()))
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Default sender-side configuration (simulated sensor)
    pub fn sender_defaults() -> Self {
        Self {
            node: NodeConfig {
                role: Role::Sender,
                id: NodeId([0x24, 0x6f, 0x28, 0xae, 0x52, 0x7c]),
            },
            radio: RadioConfig {
                channel: 6,
                base_port: 47600,
                bind_address: "0.0.0.0".to_string(),
                peer_id: Some(NodeId([0xa4, 0xcf, 0x12, 0x05, 0xc8, 0x3e])),
                peer_address: Some("127.0.0.1".to_string()),
                register_broadcast: true,
            },
            detection: DetectionConfig::default(),
            device: DeviceConfig {
                kind: "sim".to_string(),
                sim_target_cm: default_sim_target(),
                sim_noise_cm: default_sim_noise(),
                sim_dropout: 0.02,
            },
        }
    }

    /// Default receiver-side configuration
    pub fn receiver_defaults() -> Self {
        let mut config = Self::sender_defaults();
        config.node.role = Role::Receiver;
        config.node.id = NodeId([0xa4, 0xcf, 0x12, 0x05, 0xc8, 0x3e]);
        config.radio.peer_id = None;
        config.radio.peer_address = None;
        config
    }

    fn validate(&self) -> Result<()> {
        if self.node.role == Role::Sender
            && (self.radio.peer_id.is_none() || self.radio.peer_address.is_none())
        {
            return Err(Error::Config(
                "sender role requires radio.peer_id and radio.peer_address".to_string(),
            ));
        }
        if self.detection.alert_threshold_cm == 0 {
            return Err(Error::Config("alert_threshold_cm must be nonzero".to_string()));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::sender_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_defaults() {
        let config = Config::sender_defaults();
        assert_eq!(config.node.role, Role::Sender);
        assert_eq!(config.radio.channel, 6);
        assert_eq!(config.detection.alert_threshold_cm, 80);
        assert_eq!(config.detection.sample_period_ms, 700);
        assert!(config.radio.peer_id.is_some());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::sender_defaults();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[node]"));
        assert!(toml_string.contains("[radio]"));
        assert!(toml_string.contains("channel = 6"));
        assert!(toml_string.contains("id = \"24:6f:28:ae:52:7c\""));

        let parsed: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(parsed.node.id, config.node.id);
        assert_eq!(parsed.radio.channel, config.radio.channel);
    }

    #[test]
    fn test_minimal_receiver_config() {
        let toml_content = r#"
[node]
role = "receiver"
id = "a4:cf:12:05:c8:3e"

[radio]
channel = 6
base_port = 47600
bind_address = "0.0.0.0"

[device]
kind = "sim"
"#;
        let config: Config = toml::from_str(toml_content).unwrap();
        config.validate().unwrap();
        assert_eq!(config.node.role, Role::Receiver);
        // Detection section falls back to the deployed defaults
        assert_eq!(config.detection.alert_threshold_cm, 80);
        assert_eq!(config.detection.sample_period_ms, 700);
    }

    #[test]
    fn test_sender_requires_peer() {
        let mut config = Config::sender_defaults();
        config.radio.peer_id = None;
        assert!(config.validate().is_err());
    }
}
