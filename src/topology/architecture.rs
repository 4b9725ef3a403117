//! Descriptive layout of a set of networks.
//!
//! [`NetworksArchitecture`] only names things: networks, witness node groups
//! and witness accounts. Nothing is allocated or started here; see
//! [`super::builder::NetworksBuilder`] for that.

use super::types::TopologyConfig;
use std::fmt;

/// Suffixes of network and witness names
pub const GREEK_ALPHABET: [&str; 24] = [
    "alpha", "beta", "gamma", "delta", "epsi", "zeta", "eta", "theta", "iota", "kappa", "lambda", "mu",
    "nu", "xi", "omi", "pi", "rho", "sigma", "tau", "upsi", "phi", "chi", "psi", "omega",
];

/// Greek letter name for `index`, wrapping around after `omega`
pub fn greek(index: usize) -> &'static str {
    GREEK_ALPHABET[index % GREEK_ALPHABET.len()]
}

/// Name of the network created at `index`.
///
/// Once the alphabet wraps the index is appended, so names stay unique.
pub fn network_name(index: usize) -> String {
    if index < GREEK_ALPHABET.len() {
        format!("Network-{}", greek(index))
    } else {
        format!("Network-{}-{}", greek(index), index)
    }
}

/// Witness accounts served by one witness node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessGroup {
    pub name: String,
    pub witnesses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkLayout {
    pub name: String,
    pub init_node: bool,
    pub api_node: bool,
    pub witness_nodes: Vec<WitnessGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworksArchitecture {
    pub networks: Vec<NetworkLayout>,
    /// Number of declared nodes across all networks
    pub nodes_number: usize,
}

impl NetworksArchitecture {
    /// Name every network, witness node and witness account of `config`.
    ///
    /// Witness account numbers run on across networks, witness node numbers
    /// restart in every network.
    pub fn load(config: &TopologyConfig) -> Self {
        let mut architecture = Self::default();
        let mut next_witness = 0;

        for (network_index, spec) in config.networks.iter().enumerate() {
            let suffix = greek(network_index);

            let witness_nodes = spec
                .witness_nodes
                .iter()
                .enumerate()
                .map(|(group_index, &count)| {
                    let witnesses = (next_witness..next_witness + count)
                        .map(|i| format!("witness{}-{}", i, suffix))
                        .collect();
                    next_witness += count;
                    WitnessGroup {
                        name: format!("WitnessNode-{}", group_index),
                        witnesses,
                    }
                })
                .collect();

            architecture.nodes_number += spec.nodes_number();
            architecture.networks.push(NetworkLayout {
                name: network_name(network_index),
                init_node: spec.init_node,
                api_node: spec.api_node,
                witness_nodes,
            });
        }

        architecture
    }

    /// Every witness account name, in declaration order
    pub fn witness_names(&self) -> Vec<String> {
        self.networks
            .iter()
            .flat_map(|network| &network.witness_nodes)
            .flat_map(|group| group.witnesses.iter().cloned())
            .collect()
    }
}

impl fmt::Display for WitnessGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} ", self.name)?;
        for witness in &self.witnesses {
            write!(f, "({})", witness)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for NetworkLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.name)?;
        if self.init_node {
            f.write_str("\n  (InitNode)")?;
        }
        if self.api_node {
            f.write_str("\n  (ApiNode)")?;
        }
        for group in &self.witness_nodes {
            write!(f, "\n  {}", group)?;
        }
        Ok(())
    }
}

impl fmt::Display for NetworksArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, network) in self.networks.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", network)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::NetworkSpec;

    fn config() -> TopologyConfig {
        TopologyConfig {
            networks: vec![
                NetworkSpec {
                    init_node: true,
                    api_node: true,
                    witness_nodes: vec![1, 2, 4],
                },
                NetworkSpec {
                    init_node: false,
                    api_node: true,
                    witness_nodes: vec![6, 5],
                },
            ],
        }
    }

    #[test]
    fn test_display_tree() {
        let architecture = NetworksArchitecture::load(&config());
        let expected = "\
(Network-alpha)
  (InitNode)
  (ApiNode)
  (WitnessNode-0 (witness0-alpha))
  (WitnessNode-1 (witness1-alpha)(witness2-alpha))
  (WitnessNode-2 (witness3-alpha)(witness4-alpha)(witness5-alpha)(witness6-alpha))
(Network-beta)
  (ApiNode)
  (WitnessNode-0 (witness7-beta)(witness8-beta)(witness9-beta)(witness10-beta)(witness11-beta)(witness12-beta))
  (WitnessNode-1 (witness13-beta)(witness14-beta)(witness15-beta)(witness16-beta)(witness17-beta))";
        assert_eq!(architecture.to_string(), expected);
    }

    #[test]
    fn test_nodes_number_counts_declared_nodes() {
        let architecture = NetworksArchitecture::load(&config());
        assert_eq!(architecture.nodes_number, 8);
        assert_eq!(architecture.witness_names().len(), 18);
    }

    #[test]
    fn test_greek_wraps() {
        assert_eq!(greek(0), "alpha");
        assert_eq!(greek(23), "omega");
        assert_eq!(greek(24), "alpha");
        assert_eq!(greek(25), "beta");

        assert_eq!(network_name(0), "Network-alpha");
        assert_eq!(network_name(23), "Network-omega");
        assert_eq!(network_name(24), "Network-alpha-24");
    }

    #[test]
    fn test_wrapped_network_names_are_unique() {
        let config = TopologyConfig {
            networks: vec![NetworkSpec::default(); 30],
        };
        let architecture = NetworksArchitecture::load(&config);
        let mut names: Vec<&str> = architecture.networks.iter().map(|n| n.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 30);
    }
}
