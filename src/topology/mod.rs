//! Network topology module.
//!
//! This module contains the description of a set of networks, the builder
//! turning that description into nodes, and the networks themselves with
//! their peer links.

pub mod architecture;
pub mod builder;
pub mod error;
pub mod network;
pub mod types;

// Re-export key types for easier access
pub use architecture::{greek, network_name, NetworksArchitecture, GREEK_ALPHABET};
pub use builder::{BuiltTopology, NetworksBuilder};
pub use error::TopologyError;
pub use network::Network;
pub use types::{NetworkSpec, TopologyConfig};
