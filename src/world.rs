//! Scope owning every network of a test.
//!
//! Dropping a [`World`] closes every node and wallet it started.

use crate::context::{Context, ContextError};
use crate::process::{Node, NodeRole, Wallet};
use crate::settings::HarnessConfig;
use crate::topology::{network_name, BuiltTopology, Network, NetworksArchitecture, NetworksBuilder, TopologyError};
use crate::utils::binary::PathsToExecutables;
use log::{debug, info};

#[derive(Debug)]
pub struct World {
    context: Context,
    networks: Vec<Network>,
}

impl World {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            networks: Vec::new(),
        }
    }

    pub fn from_config(config: &HarnessConfig, paths: PathsToExecutables) -> Result<Self, ContextError> {
        Ok(Self::new(Context::from_config(config, paths)?))
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    /// Add an empty network named after the next greek letter
    pub fn create_network(&mut self) -> &mut Network {
        let index = self.networks.len();
        let mut name = network_name(index);
        let mut attempt = 0;
        while self.index_of(&name).is_ok() {
            attempt += 1;
            name = format!("{}-{}", network_name(index), attempt);
        }
        self.networks.push(Network::new(name));
        let index = self.networks.len() - 1;
        &mut self.networks[index]
    }

    pub fn network(&self, name: &str) -> Result<&Network, TopologyError> {
        Ok(&self.networks[self.index_of(name)?])
    }

    pub fn network_mut(&mut self, name: &str) -> Result<&mut Network, TopologyError> {
        let index = self.index_of(name)?;
        Ok(&mut self.networks[index])
    }

    fn index_of(&self, name: &str) -> Result<usize, TopologyError> {
        self.networks
            .iter()
            .position(|network| network.name() == name)
            .ok_or_else(|| TopologyError::UnknownNetwork(name.to_string()))
    }

    /// Create the init node of the world inside `network`
    pub fn create_init_node(&mut self, network: &str) -> Result<&mut Node, TopologyError> {
        let index = self.index_of(network)?;
        if let Some(existing) = self.networks.iter().find(|candidate| candidate.has_init_node()) {
            return Err(TopologyError::DuplicateInitNode {
                first: existing.name().to_string(),
                second: network.to_string(),
            });
        }
        self.networks[index].create_node(&mut self.context, NodeRole::Init)
    }

    pub fn create_witness_node(&mut self, network: &str, witnesses: Vec<String>) -> Result<&mut Node, TopologyError> {
        let index = self.index_of(network)?;
        self.networks[index].create_witness_node(&mut self.context, witnesses)
    }

    pub fn create_api_node(&mut self, network: &str) -> Result<&mut Node, TopologyError> {
        let index = self.index_of(network)?;
        self.networks[index].create_api_node(&mut self.context)
    }

    /// Build `architecture` into this world and return its witness names.
    pub fn build(&mut self, architecture: &NetworksArchitecture) -> Result<Vec<String>, TopologyError> {
        let mut built = NetworksBuilder::build(architecture, &mut self.context)?;
        let witness_names = std::mem::take(&mut built.witness_names);
        self.add_topology(built)?;
        Ok(witness_names)
    }

    /// Take ownership of built networks.
    pub fn add_topology(&mut self, topology: BuiltTopology) -> Result<(), TopologyError> {
        for (position, network) in topology.networks.iter().enumerate() {
            let repeated = topology.networks[..position]
                .iter()
                .any(|earlier| earlier.name() == network.name());
            if repeated || self.index_of(network.name()).is_ok() {
                return Err(TopologyError::DuplicateNetwork(network.name().to_string()));
            }
        }

        let existing = self.networks.iter().find(|network| network.has_init_node());
        let incoming = topology.networks.iter().find(|network| network.has_init_node());
        if let (Some(first), Some(second)) = (existing, incoming) {
            return Err(TopologyError::DuplicateInitNode {
                first: first.name().to_string(),
                second: second.name().to_string(),
            });
        }

        self.networks.extend(topology.networks);
        Ok(())
    }

    fn pair_mut(&mut self, first: &str, second: &str) -> Result<(&mut Network, &mut Network), TopologyError> {
        let a = self.index_of(first)?;
        let b = self.index_of(second)?;
        if a == b {
            return Err(TopologyError::SelfConnection(first.to_string()));
        }

        let (low, high) = (a.min(b), a.max(b));
        let (head, tail) = self.networks.split_at_mut(high);
        let (low, high) = (&mut head[low], &mut tail[0]);
        Ok(if a < b { (low, high) } else { (high, low) })
    }

    /// Link two networks and update the allowed peers of running nodes.
    pub fn connect(&mut self, first: &str, second: &str) -> Result<bool, TopologyError> {
        let (a, b) = self.pair_mut(first, second)?;
        let changed = a.connect_with(b)?;
        if changed {
            self.refresh_allowed_peers()?;
        }
        Ok(changed)
    }

    /// Unlink two networks and update the allowed peers of running nodes.
    pub fn disconnect(&mut self, first: &str, second: &str) -> Result<bool, TopologyError> {
        let (a, b) = self.pair_mut(first, second)?;
        let changed = a.disconnect_from(b);
        if changed {
            self.refresh_allowed_peers()?;
        }
        Ok(changed)
    }

    /// Let every running node talk to the nodes of its own network and of
    /// directly connected networks only.
    pub fn refresh_allowed_peers(&mut self) -> Result<(), TopologyError> {
        // Node ids of the running nodes, per network
        let mut node_ids: Vec<Vec<(usize, String)>> = Vec::with_capacity(self.networks.len());
        for network in &mut self.networks {
            let mut ids = Vec::new();
            for (position, node) in network.nodes_mut().iter_mut().enumerate() {
                if node.is_running() {
                    ids.push((position, node.p2p_node_id()?));
                }
            }
            node_ids.push(ids);
        }

        for (index, network) in self.networks.iter().enumerate() {
            let mut allowed: Vec<&str> = node_ids[index].iter().map(|(_, id)| id.as_str()).collect();
            for (other_index, other) in self.networks.iter().enumerate() {
                if network.is_connected_with(other.name()) {
                    allowed.extend(node_ids[other_index].iter().map(|(_, id)| id.as_str()));
                }
            }

            for (position, own_id) in &node_ids[index] {
                let peers: Vec<String> = allowed
                    .iter()
                    .filter(|id| **id != own_id.as_str())
                    .map(|id| id.to_string())
                    .collect();
                network.nodes()[*position].set_allowed_peers(&peers)?;
            }
            debug!("{} allows {} node(s)", network.name(), allowed.len());
        }
        Ok(())
    }

    /// Start every network in creation order.
    ///
    /// Nodes of a network additionally seed from the running nodes of the
    /// networks it is connected with.
    pub fn run(&mut self) -> Result<(), TopologyError> {
        for index in 0..self.networks.len() {
            let mut extra_seeds = Vec::new();
            for other_index in 0..self.networks.len() {
                let other_name = self.networks[other_index].name().to_string();
                if other_index != index && self.networks[index].is_connected_with(&other_name) {
                    extra_seeds.extend(self.networks[other_index].running_p2p_endpoints());
                }
            }
            self.networks[index].run(&self.context, &extra_seeds)?;
        }

        if self.networks.len() > 1 {
            self.refresh_allowed_peers()?;
        }
        info!("World is running {} network(s)", self.networks.len());
        Ok(())
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.networks.iter().find_map(|network| network.node(name))
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.networks.iter_mut().find_map(|network| network.node_mut(name))
    }

    /// Start a wallet attached to the running node `node_name`
    pub fn attach_wallet(&mut self, node_name: &str) -> Result<&mut Wallet, TopologyError> {
        let node = self
            .networks
            .iter_mut()
            .find_map(|network| network.node_mut(node_name))
            .ok_or_else(|| TopologyError::UnknownNode(node_name.to_string()))?;
        Ok(node.attach_wallet(&self.context)?)
    }

    /// Close every network, last created first.
    pub fn close(&mut self) {
        for network in self.networks.iter_mut().rev() {
            network.close();
        }
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.close();
    }
}
