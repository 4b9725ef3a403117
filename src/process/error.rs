use crate::account::AccountError;
use crate::node_config::entry_types::EntryError;
use crate::node_config::ConfigError;
use crate::ports::PortError;
use crate::rpc::CommunicationError;
use crate::utils::binary::BinaryError;
use std::path::PathBuf;

/// Errors raised while starting, driving or stopping a process
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// An operation was called before its inputs were configured
    #[error("{0}")]
    Precondition(String),

    #[error("Node {name} is not running")]
    NodeIsNotRunning { name: String },

    #[error("{name} failed to start: {reason} (see {})", stderr.display())]
    StartupFailure {
        name: String,
        reason: String,
        stderr: PathBuf,
    },

    #[error("Failed to spawn {name} from {}: {source}", program.display())]
    Spawn {
        name: String,
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Binary(#[from] BinaryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid node config value: {0}")]
    Entry(#[from] EntryError),

    #[error(transparent)]
    Communication(#[from] CommunicationError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
