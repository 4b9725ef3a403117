//! Turning a [`NetworksArchitecture`] into networks of not yet started nodes.

use super::architecture::NetworksArchitecture;
use super::network::Network;
use super::TopologyError;
use crate::context::Context;
use crate::process::NodeRole;
use log::info;

/// Networks created from an architecture
#[derive(Debug, Default)]
pub struct BuiltTopology {
    pub networks: Vec<Network>,
    /// Name of the init node, if the architecture declares one
    pub init_node: Option<String>,
    pub witness_names: Vec<String>,
}

pub struct NetworksBuilder;

impl NetworksBuilder {
    /// Create the nodes of every network: the init node first, then the
    /// witness nodes, then the API node.
    ///
    /// At most one network may declare an init node; nothing is created when
    /// a second one is found.
    pub fn build(architecture: &NetworksArchitecture, context: &mut Context) -> Result<BuiltTopology, TopologyError> {
        let mut init_networks = architecture.networks.iter().filter(|network| network.init_node);
        if let (Some(first), Some(second)) = (init_networks.next(), init_networks.next()) {
            return Err(TopologyError::DuplicateInitNode {
                first: first.name.clone(),
                second: second.name.clone(),
            });
        }

        let mut built = BuiltTopology::default();
        for layout in &architecture.networks {
            let mut network = Network::new(layout.name.clone());

            if layout.init_node {
                let node = network.create_node(context, NodeRole::Init)?;
                built.init_node = Some(node.name().to_string());
            }

            for group in &layout.witness_nodes {
                built.witness_names.extend(group.witnesses.iter().cloned());
                network.create_witness_node(context, group.witnesses.clone())?;
            }

            if layout.api_node {
                network.create_api_node(context)?;
            }

            info!("Built {} with {} node(s)", network.name(), network.nodes().len());
            built.networks.push(network);
        }

        Ok(built)
    }
}
