use crate::ports::PortError;
use crate::process::ProcessError;

/// Errors raised while building or rewiring networks
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("InitNode already exists in {first}, cannot create another one in {second}")]
    DuplicateInitNode { first: String, second: String },

    #[error("Unknown network {0}")]
    UnknownNetwork(String),

    #[error("Network {0} already exists")]
    DuplicateNetwork(String),

    #[error("Unknown node {0}")]
    UnknownNode(String),

    #[error("Network {0} cannot be connected with itself")]
    SelfConnection(String),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}
