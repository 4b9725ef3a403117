//! Process lifecycle module.
//!
//! This module starts and stops the executables of a test network: `hived`
//! nodes and the `cli_wallet` instances attached to them.

pub mod error;
pub mod handle;
pub mod node;
pub mod types;
pub mod wallet;

// Re-export commonly used types for convenience
pub use error::ProcessError;
pub use handle::{CloseOutcome, LogStream, ProcessHandle};
pub use node::Node;
pub use types::{NodeRole, ProcessState};
pub use wallet::Wallet;
