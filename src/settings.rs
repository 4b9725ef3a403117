//! Harness settings.
//!
//! Settings are read from a YAML file by [`crate::config_loader::load_config`].
//! Every section and field is optional:
//!
//! ```yaml
//! general:
//!   working_directory: "generated/smoke"
//!   worker_id: 2
//!   log_level: debug
//!
//! timeouts:
//!   readiness: "90s"
//!   poll_interval: "100ms"
//!   handshake_attempts: 30
//!   handshake_interval: "1s"
//!   close: "3s"
//!
//! executables:
//!   hived: "/home/dev/hive/build/programs/hived/hived"
//!
//! topology:
//!   networks:
//!     - InitNode: true
//!       WitnessNodes: [2]
//! ```

use crate::ports::DEFAULT_BASE_PORT;
use crate::topology::TopologyConfig;
use crate::utils::binary::SUPPORTED_EXECUTABLES;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Harness settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub timeouts: Timeouts,

    /// Explicit executable paths by logical name
    #[serde(default)]
    pub executables: BTreeMap<String, PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<TopologyConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Root of every process directory; a timestamped directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,

    /// Port window number; `HIVENET_WORKER_ID` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<u16>,

    #[serde(default = "default_base_port")]
    pub base_port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Bounds of every wait the harness performs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeouts {
    /// Time a node gets to print its readiness marker
    #[serde(default = "default_readiness", with = "humantime_serde")]
    pub readiness: Duration,

    /// Pause between two log file checks
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    #[serde(default = "default_handshake_attempts")]
    pub handshake_attempts: u32,

    #[serde(default = "default_handshake_interval", with = "humantime_serde")]
    pub handshake_interval: Duration,

    /// Grace period between SIGINT and SIGKILL
    #[serde(default = "default_close", with = "humantime_serde")]
    pub close: Duration,
}

fn default_base_port() -> u16 {
    DEFAULT_BASE_PORT
}

fn default_readiness() -> Duration {
    Duration::from_secs(90)
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_handshake_attempts() -> u32 {
    30
}

fn default_handshake_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_close() -> Duration {
    Duration::from_secs(3)
}

/// Default implementations
impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            working_directory: None,
            worker_id: None,
            base_port: default_base_port(),
            log_level: Some("info".to_string()),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            readiness: default_readiness(),
            poll_interval: default_poll_interval(),
            handshake_attempts: default_handshake_attempts(),
            handshake_interval: default_handshake_interval(),
            close: default_close(),
        }
    }
}

/// Settings validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid timeouts configuration: {0}")]
    InvalidTimeouts(String),
    #[error("Invalid executables configuration: {0}")]
    InvalidExecutables(String),
    #[error("Invalid topology configuration: {0}")]
    InvalidTopology(String),
}

impl HarnessConfig {
    /// Validate the settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.general.base_port == 0 {
            return Err(ValidationError::InvalidGeneral(
                "base_port cannot be 0".to_string(),
            ));
        }

        if self.timeouts.poll_interval.is_zero() {
            return Err(ValidationError::InvalidTimeouts(
                "poll_interval cannot be zero".to_string(),
            ));
        }
        if self.timeouts.readiness < self.timeouts.poll_interval {
            return Err(ValidationError::InvalidTimeouts(
                "readiness must be at least one poll_interval".to_string(),
            ));
        }
        if self.timeouts.handshake_attempts == 0 {
            return Err(ValidationError::InvalidTimeouts(
                "handshake_attempts must be at least 1".to_string(),
            ));
        }

        for name in self.executables.keys() {
            if !SUPPORTED_EXECUTABLES.iter().any(|executable| executable.name == name.as_str()) {
                return Err(ValidationError::InvalidExecutables(format!(
                    "executable {} is not supported",
                    name
                )));
            }
        }

        if let Some(topology) = &self.topology {
            Self::validate_topology(topology)?;
        }

        Ok(())
    }

    fn validate_topology(topology: &TopologyConfig) -> Result<(), ValidationError> {
        let init_nodes = topology.networks.iter().filter(|network| network.init_node).count();
        if init_nodes > 1 {
            return Err(ValidationError::InvalidTopology(format!(
                "only one network can have an InitNode, found {}",
                init_nodes
            )));
        }

        for (index, network) in topology.networks.iter().enumerate() {
            if network.witness_nodes.contains(&0) {
                return Err(ValidationError::InvalidTopology(format!(
                    "network {} declares a witness node without witnesses",
                    index
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::NetworkSpec;

    #[test]
    fn test_defaults_from_empty_document() {
        let config: HarnessConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.timeouts.handshake_attempts, 30);
        assert_eq!(config.timeouts.close, Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_humantime_durations() {
        let yaml = r#"
timeouts:
  readiness: "2m"
  poll_interval: "250ms"
"#;
        let config: HarnessConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.timeouts.readiness, Duration::from_secs(120));
        assert_eq!(config.timeouts.poll_interval, Duration::from_millis(250));
        assert_eq!(config.timeouts.handshake_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_unknown_executable_is_rejected() {
        let mut config = HarnessConfig::default();
        config.executables.insert("geth".to_string(), PathBuf::from("/usr/bin/geth"));
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidExecutables(_))
        ));
    }

    #[test]
    fn test_two_init_nodes_are_rejected() {
        let network = NetworkSpec {
            init_node: true,
            ..NetworkSpec::default()
        };
        let config = HarnessConfig {
            topology: Some(TopologyConfig {
                networks: vec![network.clone(), network],
            }),
            ..HarnessConfig::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTopology(_))));
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let mut config = HarnessConfig::default();
        config.timeouts.poll_interval = Duration::ZERO;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTimeouts(_))));
    }
}
