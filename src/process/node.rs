//! `hived` node process.
//!
//! A node is created with its name, role, directory and ports. Running it
//! fills the unset parts of its [`NodeConfig`] from its role, writes
//! `config.ini` into its directory and starts `hived` on that directory.

use super::handle::{CloseOutcome, LogStream, ProcessHandle};
use super::types::{NodeRole, ProcessState};
use super::wallet::Wallet;
use super::ProcessError;
use crate::account::Account;
use crate::context::Context;
use crate::node_config::NodeConfig;
use crate::ports::NodePorts;
use crate::rpc::api::NodeApi;
use crate::rpc::{CommunicationError, RpcClient};
use crate::utils::binary::HIVED;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Printed on stderr once the node serves websocket requests
pub const READY_MARKER: &str = "start listening for ws requests";

pub const CONFIG_FILE_NAME: &str = "config.ini";

const BASE_PLUGINS: [&str; 9] = [
    "p2p",
    "webserver",
    "json_rpc",
    "database_api",
    "network_node_api",
    "account_by_key",
    "account_by_key_api",
    "condenser_api",
    "wallet_bridge_api",
];

const API_PLUGINS: [&str; 4] = [
    "market_history",
    "market_history_api",
    "account_history_rocksdb",
    "account_history_api",
];

pub const MARKET_HISTORY_BUCKETS: [i64; 5] = [15, 60, 300, 3600, 86400];

#[derive(Debug)]
pub struct Node {
    name: String,
    role: NodeRole,
    pub config: NodeConfig,
    directory: PathBuf,
    ports: NodePorts,
    executable: Option<PathBuf>,
    arguments: Vec<String>,
    process: Option<ProcessHandle>,
    state: ProcessState,
    rpc: Option<RpcClient>,
    wallets: Vec<Wallet>,
}

impl Node {
    pub fn new(name: impl Into<String>, role: NodeRole, directory: impl Into<PathBuf>, ports: NodePorts) -> Self {
        Self {
            name: name.into(),
            role,
            config: NodeConfig::new(),
            directory: directory.into(),
            ports,
            executable: None,
            arguments: Vec::new(),
            process: None,
            state: ProcessState::Created,
            rpc: None,
            wallets: Vec::new(),
        }
    }

    /// Node named and placed by `context`, with freshly allocated ports
    pub fn create(context: &mut Context, role: NodeRole) -> Result<Self, ProcessError> {
        let name = context.next_node_name(&role);
        let ports = context.ports.allocate_node_ports()?;
        let directory = context.node_directory(&name);
        debug!("Created {} ({}) with ports {:?}", name, role, ports);
        Ok(Self::new(name, role, directory, ports))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &NodeRole {
        &self.role
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn ports(&self) -> NodePorts {
        self.ports
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn set_executable_file_path(&mut self, path: impl Into<PathBuf>) {
        self.executable = Some(path.into());
    }

    /// Extra command-line arguments appended after `-d <directory>`
    pub fn add_arguments<I, S>(&mut self, arguments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(arguments.into_iter().map(Into::into));
    }

    pub fn p2p_endpoint(&self) -> String {
        format!("127.0.0.1:{}", self.ports.p2p)
    }

    pub fn http_endpoint(&self) -> String {
        format!("127.0.0.1:{}", self.ports.http)
    }

    pub fn ws_endpoint(&self) -> String {
        format!("127.0.0.1:{}", self.ports.ws)
    }

    pub fn is_running(&mut self) -> bool {
        let running = self.process.as_mut().is_some_and(ProcessHandle::is_running);
        if !running && self.state == ProcessState::Running {
            self.state = ProcessState::Stopped;
            self.rpc = None;
        }
        running
    }

    /// Start the node with `seeds` as additional p2p seed nodes.
    pub fn run(&mut self, context: &Context, seeds: &[String]) -> Result<(), ProcessError> {
        if self.process.is_some() {
            return Err(ProcessError::Precondition(format!("{} is already running", self.name)));
        }

        let executable = match &self.executable {
            Some(path) => path.clone(),
            None => context.paths.get_path_of(HIVED)?,
        };

        self.apply_role_defaults(context)?;
        self.apply_endpoints(seeds)?;

        fs::create_dir_all(&self.directory)?;
        let directory = fs::canonicalize(&self.directory)?;
        self.config.write_to_file(&directory.join(CONFIG_FILE_NAME))?;

        let mut arguments = vec!["-d".to_string(), directory.display().to_string()];
        arguments.extend(self.arguments.iter().cloned());

        let mut process = ProcessHandle::spawn(&*self.name, &executable, &arguments, &directory)?
            .with_close_timeout(context.timeouts.close);
        process.wait_for_marker(
            LogStream::Stderr,
            READY_MARKER,
            context.timeouts.readiness,
            context.timeouts.poll_interval,
        )?;

        let rpc = RpcClient::new(format!("http://{}", self.http_endpoint()))?;
        process.handshake(
            context.timeouts.handshake_attempts,
            context.timeouts.handshake_interval,
            || NodeApi::new(&rpc).get_dynamic_global_properties(),
        )?;

        info!("{} ({}) is running, p2p {}", self.name, self.role, self.p2p_endpoint());
        self.process = Some(process);
        self.rpc = Some(rpc);
        self.state = ProcessState::Running;
        Ok(())
    }

    fn apply_role_defaults(&mut self, context: &Context) -> Result<(), ProcessError> {
        let config = &mut self.config;

        if config.log_appender.is_empty() {
            config
                .log_appender
                .push(r#"{"appender":"stderr","stream":"std_error"}"#)?;
        }
        if config.log_logger.is_empty() {
            config
                .log_logger
                .push(r#"{"name":"default","level":"info","appender":"stderr"}"#)?;
        }
        if config.plugin.is_empty() {
            config.plugin.extend(BASE_PLUGINS)?;
            match self.role {
                NodeRole::Init | NodeRole::Witness { .. } => config.plugin.push("witness")?,
                NodeRole::Api => config.plugin.extend(API_PLUGINS)?,
            }
        }
        if config.shared_file_size.get_value().is_none() {
            config.shared_file_size.set_value("1G")?;
        }

        match &self.role {
            NodeRole::Init => {
                if config.witness.is_empty() {
                    let initminer = Account::initminer();
                    config.witness.push(initminer.name)?;
                    config.private_key.push(initminer.private_key)?;
                }
                if config.enable_stale_production.get_value().is_none() {
                    config.enable_stale_production.set(true);
                }
                if config.required_participation.get_value().is_none() {
                    config.required_participation.set(0);
                }
                if config.witness_skip_enforce_bandwidth.get_value().is_none() {
                    config.witness_skip_enforce_bandwidth.set(true);
                }
            }
            NodeRole::Witness { witnesses } => {
                if config.witness.is_empty() && !witnesses.is_empty() {
                    let accounts = Account::generate_many(&context.paths, witnesses)?;
                    for account in accounts {
                        config.witness.push(account.name)?;
                        config.private_key.push(account.private_key)?;
                    }
                }
                if config.witness_skip_enforce_bandwidth.get_value().is_none() {
                    config.witness_skip_enforce_bandwidth.set(true);
                }
            }
            NodeRole::Api => {
                if config.market_history_bucket_size.is_empty() {
                    config.market_history_bucket_size.extend(MARKET_HISTORY_BUCKETS)?;
                }
                if config.market_history_buckets_per_size.get_value().is_none() {
                    config.market_history_buckets_per_size.set(5760);
                }
                if config.account_history_rocksdb_path.get_value().is_none() {
                    config
                        .account_history_rocksdb_path
                        .set_value("blockchain/account-history-rocksdb-storage")?;
                }
            }
        }

        Ok(())
    }

    fn apply_endpoints(&mut self, seeds: &[String]) -> Result<(), ProcessError> {
        let own = self.p2p_endpoint();
        let config = &mut self.config;
        if config.p2p_endpoint.get_value().is_none() {
            config.p2p_endpoint.set_value(format!("0.0.0.0:{}", self.ports.p2p))?;
        }
        if config.webserver_http_endpoint.get_value().is_none() {
            config
                .webserver_http_endpoint
                .set_value(format!("0.0.0.0:{}", self.ports.http))?;
        }
        if config.webserver_ws_endpoint.get_value().is_none() {
            config
                .webserver_ws_endpoint
                .set_value(format!("0.0.0.0:{}", self.ports.ws))?;
        }

        for seed in seeds {
            let known = config.p2p_seed_node.get_value().contains(seed);
            if !known && *seed != own {
                config.p2p_seed_node.push(seed.as_str())?;
            }
        }
        Ok(())
    }

    pub fn api(&self) -> Result<NodeApi<'_>, ProcessError> {
        self.rpc
            .as_ref()
            .map(NodeApi::new)
            .ok_or_else(|| ProcessError::NodeIsNotRunning { name: self.name.clone() })
    }

    /// Id of this node in the p2p network
    pub fn p2p_node_id(&self) -> Result<String, ProcessError> {
        let info = self.api()?.get_info()?;
        info.get("node_id")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                ProcessError::Communication(CommunicationError::InvalidResponse {
                    endpoint: self.http_endpoint(),
                    reason: "network_node_api.get_info returned no node_id".to_string(),
                })
            })
    }

    /// Restrict p2p connections of this node to `node_ids`
    pub fn set_allowed_peers(&self, node_ids: &[String]) -> Result<(), ProcessError> {
        self.api()?.set_allowed_peers(node_ids)?;
        debug!("{} allows {} peer(s)", self.name, node_ids.len());
        Ok(())
    }

    /// Start a wallet connected to this node.
    ///
    /// The wallet lives in `<node directory>/wallet` and is closed with the node.
    pub fn attach_wallet(&mut self, context: &Context) -> Result<&mut Wallet, ProcessError> {
        if !self.is_running() {
            return Err(ProcessError::NodeIsNotRunning { name: self.name.clone() });
        }

        let index = self.wallets.len();
        let (name, directory) = match index {
            0 => (format!("{}-wallet", self.name), self.directory.join("wallet")),
            n => (format!("{}-wallet{}", self.name, n), self.directory.join(format!("wallet{}", n))),
        };

        let mut wallet = Wallet::new(name, directory);
        wallet.connect_to(self);
        wallet.set_http_server_port(context.ports.allocate()?);
        wallet.run(context)?;

        self.wallets.push(wallet);
        let index = self.wallets.len() - 1;
        Ok(&mut self.wallets[index])
    }

    pub fn wallets(&self) -> &[Wallet] {
        &self.wallets
    }

    /// Close attached wallets, then the node itself.
    pub fn close(&mut self) -> Option<CloseOutcome> {
        for wallet in &mut self.wallets {
            wallet.close();
        }
        self.rpc = None;
        let outcome = self.process.take().and_then(|mut process| process.close());
        if outcome.is_some() {
            self.state = ProcessState::Stopped;
        }
        outcome
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortAllocator;
    use crate::utils::binary::PathsToExecutables;

    fn ports() -> NodePorts {
        NodePorts {
            p2p: 2001,
            http: 8090,
            ws: 8091,
        }
    }

    fn context() -> Context {
        Context::new(
            PathsToExecutables::empty(),
            PortAllocator::with_range(30000, 30010),
            "/tmp/hivenet-node-tests",
        )
    }

    #[test]
    fn test_init_defaults() {
        let mut node = Node::new("InitNode", NodeRole::Init, "/tmp/init", ports());
        node.apply_role_defaults(&context()).unwrap();

        assert_eq!(node.config.witness.get_value(), ["initminer"]);
        assert_eq!(node.config.private_key.get_value().len(), 1);
        assert_eq!(node.config.enable_stale_production.get_value(), Some(&true));
        assert_eq!(node.config.required_participation.get_value(), Some(&0));
        assert!(node.config.plugin.get_value().iter().any(|p| p == "witness"));
    }

    #[test]
    fn test_explicit_values_survive_defaults() {
        let mut node = Node::new("ApiNode0", NodeRole::Api, "/tmp/api", ports());
        node.config.plugin.push("database_api").unwrap();
        node.config.market_history_buckets_per_size.set(10);
        node.apply_role_defaults(&context()).unwrap();

        assert_eq!(node.config.plugin.get_value(), ["database_api"]);
        assert_eq!(node.config.market_history_buckets_per_size.get_value(), Some(&10));
        assert_eq!(node.config.market_history_bucket_size.get_value(), MARKET_HISTORY_BUCKETS);
    }

    #[test]
    fn test_witness_defaults_need_get_dev_key() {
        let role = NodeRole::Witness {
            witnesses: vec!["witness0-alpha".to_string()],
        };
        let mut node = Node::new("WitnessNode0", role, "/tmp/witness", ports());
        assert!(matches!(
            node.apply_role_defaults(&context()),
            Err(ProcessError::Account(_))
        ));
    }

    #[test]
    fn test_endpoints_and_seeds() {
        let mut node = Node::new("ApiNode0", NodeRole::Api, "/tmp/api", ports());
        let seeds = vec![
            "127.0.0.1:3001".to_string(),
            node.p2p_endpoint(),
            "127.0.0.1:3001".to_string(),
        ];
        node.apply_endpoints(&seeds).unwrap();

        let lines = node.config.write_to_lines();
        assert!(lines.contains(&"p2p-endpoint = 0.0.0.0:2001".to_string()));
        assert!(lines.contains(&"webserver-ws-endpoint = 0.0.0.0:8091".to_string()));
        assert!(lines.contains(&"p2p-seed-node = 127.0.0.1:3001".to_string()));
    }

    #[test]
    fn test_node_that_never_ran() {
        let mut node = Node::new("ApiNode0", NodeRole::Api, "/tmp/api", ports());
        assert!(!node.is_running());
        assert!(matches!(node.api(), Err(ProcessError::NodeIsNotRunning { .. })));
        assert!(matches!(
            node.attach_wallet(&context()),
            Err(ProcessError::NodeIsNotRunning { .. })
        ));
        assert!(node.close().is_none());
    }
}
