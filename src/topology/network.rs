//! A named group of nodes and its links to other groups.

use super::TopologyError;
use crate::context::Context;
use crate::process::{Node, NodeRole};
use log::info;
use std::collections::BTreeSet;

#[derive(Debug)]
pub struct Network {
    name: String,
    nodes: Vec<Node>,
    connected_with: BTreeSet<String>,
}

impl Network {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            connected_with: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name() == name)
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.name() == name)
    }

    pub fn has_init_node(&self) -> bool {
        self.nodes.iter().any(|node| *node.role() == NodeRole::Init)
    }

    /// Take ownership of `node`
    pub fn add_node(&mut self, node: Node) -> &mut Node {
        self.nodes.push(node);
        let index = self.nodes.len() - 1;
        &mut self.nodes[index]
    }

    pub fn create_node(&mut self, context: &mut Context, role: NodeRole) -> Result<&mut Node, TopologyError> {
        let node = Node::create(context, role)?;
        Ok(self.add_node(node))
    }

    pub fn create_witness_node(
        &mut self,
        context: &mut Context,
        witnesses: Vec<String>,
    ) -> Result<&mut Node, TopologyError> {
        self.create_node(context, NodeRole::Witness { witnesses })
    }

    pub fn create_api_node(&mut self, context: &mut Context) -> Result<&mut Node, TopologyError> {
        self.create_node(context, NodeRole::Api)
    }

    /// Link this network with `other`, in both directions.
    ///
    /// Returns whether the link is new.
    pub fn connect_with(&mut self, other: &mut Network) -> Result<bool, TopologyError> {
        if self.name == other.name {
            return Err(TopologyError::SelfConnection(self.name.clone()));
        }
        let added = self.connected_with.insert(other.name.clone());
        let added_back = other.connected_with.insert(self.name.clone());
        if added || added_back {
            info!("Connected {} with {}", self.name, other.name);
        }
        Ok(added || added_back)
    }

    /// Remove the link with `other`, in both directions.
    ///
    /// Returns whether a link existed.
    pub fn disconnect_from(&mut self, other: &mut Network) -> bool {
        let removed = self.connected_with.remove(&other.name);
        let removed_back = other.connected_with.remove(&self.name);
        if removed || removed_back {
            info!("Disconnected {} from {}", self.name, other.name);
        }
        removed || removed_back
    }

    pub fn is_connected_with(&self, name: &str) -> bool {
        self.connected_with.contains(name)
    }

    pub fn connected_networks(&self) -> impl Iterator<Item = &str> {
        self.connected_with.iter().map(String::as_str)
    }

    /// p2p endpoints of every node
    pub fn p2p_endpoints(&self) -> Vec<String> {
        self.nodes.iter().map(Node::p2p_endpoint).collect()
    }

    /// p2p endpoints of the nodes that are currently running
    pub fn running_p2p_endpoints(&mut self) -> Vec<String> {
        self.nodes
            .iter_mut()
            .filter_map(|node| node.is_running().then(|| node.p2p_endpoint()))
            .collect()
    }

    /// Start nodes in creation order.
    ///
    /// Each node seeds from `extra_seeds` and from every node of this network
    /// started before it. Nodes already running are left alone.
    pub fn run(&mut self, context: &Context, extra_seeds: &[String]) -> Result<(), TopologyError> {
        info!("Running {} ({} node(s))", self.name, self.nodes.len());
        let mut seeds = extra_seeds.to_vec();
        for node in &mut self.nodes {
            if !node.is_running() {
                node.run(context, &seeds)?;
            }
            seeds.push(node.p2p_endpoint());
        }
        Ok(())
    }

    /// Close every node, last created first.
    pub fn close(&mut self) {
        for node in self.nodes.iter_mut().rev() {
            node.close();
        }
    }
}
