//! Harness context shared by everything a test starts.
//!
//! A [`Context`] owns the executable resolver, the port window, the wait
//! bounds and the working directory. It is passed explicitly to every
//! operation that starts a process.

use crate::ports::{worker_id_from_env, PortAllocator, PortError};
use crate::process::NodeRole;
use crate::settings::{HarnessConfig, Timeouts};
use crate::utils::binary::{BinaryError, PathsToExecutables};
use crate::utils::expand::expand_env;
use log::info;
use std::path::{Path, PathBuf};

/// Parent of the timestamped run directories
pub const DEFAULT_WORKING_ROOT: &str = "generated";

#[derive(Debug)]
pub struct Context {
    pub paths: PathsToExecutables,
    pub ports: PortAllocator,
    pub timeouts: Timeouts,
    directory: PathBuf,
    witness_nodes: usize,
    api_nodes: usize,
}

impl Context {
    pub fn new(paths: PathsToExecutables, ports: PortAllocator, directory: impl Into<PathBuf>) -> Self {
        Self {
            paths,
            ports,
            timeouts: Timeouts::default(),
            directory: directory.into(),
            witness_nodes: 0,
            api_nodes: 0,
        }
    }

    /// Build a context from settings, installing their executable paths as
    /// overrides of `paths`. `$VAR` references in those paths are expanded
    /// against the process environment.
    pub fn from_config(config: &HarnessConfig, mut paths: PathsToExecutables) -> Result<Self, ContextError> {
        for (name, path) in &config.executables {
            paths.set_path_of(name, expand_env(&path.to_string_lossy()))?;
        }

        let worker_id = config.general.worker_id.unwrap_or_else(worker_id_from_env);
        let ports = PortAllocator::for_worker(config.general.base_port, worker_id)?;
        let directory = config
            .general
            .working_directory
            .clone()
            .unwrap_or_else(default_working_directory);

        info!(
            "Working directory {:?}, ports {:?} (worker {})",
            directory,
            ports.range(),
            worker_id
        );

        let mut context = Self::new(paths, ports, directory);
        context.timeouts = config.timeouts.clone();
        Ok(context)
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Name of the next node of `role`, counted across the whole context
    pub fn next_node_name(&mut self, role: &NodeRole) -> String {
        match role {
            NodeRole::Init => "InitNode".to_string(),
            NodeRole::Witness { .. } => {
                let name = format!("WitnessNode{}", self.witness_nodes);
                self.witness_nodes += 1;
                name
            }
            NodeRole::Api => {
                let name = format!("ApiNode{}", self.api_nodes);
                self.api_nodes += 1;
                name
            }
        }
    }

    pub fn node_directory(&self, node_name: &str) -> PathBuf {
        self.directory.join(node_name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    Binary(#[from] BinaryError),

    #[error(transparent)]
    Port(#[from] PortError),
}

fn default_working_directory() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    Path::new(DEFAULT_WORKING_ROOT).join(format!("run-{}", stamp))
}
