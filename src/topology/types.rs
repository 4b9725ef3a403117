//! Topology type definitions.
//!
//! These are the serde shapes of a topology description as found in a
//! harness settings file:
//!
//! ```yaml
//! networks:
//!   - InitNode: true
//!     ApiNode: true
//!     WitnessNodes: [1, 2]
//!   - WitnessNodes: [3]
//! ```

use serde::{Deserialize, Serialize};

/// Description of every network to build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyConfig {
    #[serde(default)]
    pub networks: Vec<NetworkSpec>,
}

/// Nodes declared for one network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    #[serde(rename = "InitNode", default)]
    pub init_node: bool,

    #[serde(rename = "ApiNode", default)]
    pub api_node: bool,

    /// One entry per witness node: the number of witnesses it produces for
    #[serde(rename = "WitnessNodes", default)]
    pub witness_nodes: Vec<usize>,
}

impl NetworkSpec {
    /// Number of nodes this network declares
    pub fn nodes_number(&self) -> usize {
        usize::from(self.init_node) + usize::from(self.api_node) + self.witness_nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_from_yaml() {
        let yaml = r#"
networks:
  - InitNode: true
    ApiNode: true
    WitnessNodes: [1, 2]
  - WitnessNodes: [3]
"#;
        let config: TopologyConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.networks.len(), 2);
        assert!(config.networks[0].init_node);
        assert_eq!(config.networks[0].nodes_number(), 4);
        assert!(!config.networks[1].api_node);
        assert_eq!(config.networks[1].witness_nodes, [3]);
    }
}
