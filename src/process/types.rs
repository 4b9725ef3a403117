//! Process type definitions.
//!
//! Roles of the nodes the harness starts and the states a started process
//! goes through.

use std::fmt;

/// Role of a node inside a network
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRole {
    /// Bootstraps the chain and produces blocks as `initminer`
    Init,
    /// Produces blocks for the listed witness accounts
    Witness { witnesses: Vec<String> },
    /// Serves API calls, produces nothing
    Api,
}

impl NodeRole {
    /// Get the string representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Init => "init",
            NodeRole::Witness { .. } => "witness",
            NodeRole::Api => "api",
        }
    }

    /// Witness accounts this role produces blocks for
    pub fn witnesses(&self) -> &[String] {
        match self {
            NodeRole::Witness { witnesses } => witnesses,
            NodeRole::Init | NodeRole::Api => &[],
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a started process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Created,
    Running,
    Stopped,
}

impl ProcessState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Created => "created",
            ProcessState::Running => "running",
            ProcessState::Stopped => "stopped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_witnesses() {
        let role = NodeRole::Witness {
            witnesses: vec!["witness0-alpha".to_string()],
        };
        assert_eq!(role.witnesses(), ["witness0-alpha"]);
        assert!(NodeRole::Init.witnesses().is_empty());
        assert_eq!(role.to_string(), "witness");
    }
}
