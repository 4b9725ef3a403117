//! `cli_wallet` process attached to a running node.

use super::handle::{CloseOutcome, LogStream, ProcessHandle};
use super::node::Node;
use super::types::ProcessState;
use super::ProcessError;
use crate::account::Account;
use crate::context::Context;
use crate::rpc::api::WalletApi;
use crate::rpc::RpcClient;
use crate::utils::binary::CLI_WALLET;
use log::{debug, info};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Chain id of test networks
pub const TESTNET_CHAIN_ID: &str = "04e8b5fc4bb4ab3c0ee3584199a2e584bfb2f141222b3a0d1c74e8a75ec8ff39";

pub const DEFAULT_PASSWORD: &str = "default-password";

/// Printed on stderr once the wallet serves requests
pub const READY_MARKER: &str = "Entering Daemon Mode, ^C to exit";

#[derive(Debug)]
pub struct Wallet {
    name: String,
    directory: PathBuf,
    connected_node: Option<String>,
    http_server_port: Option<u16>,
    executable: Option<PathBuf>,
    password: String,
    process: Option<ProcessHandle>,
    state: ProcessState,
    rpc: Option<RpcClient>,
}

impl Wallet {
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
            connected_node: None,
            http_server_port: None,
            executable: None,
            password: DEFAULT_PASSWORD.to_string(),
            process: None,
            state: ProcessState::Created,
            rpc: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Use the websocket endpoint of `node`
    pub fn connect_to(&mut self, node: &Node) {
        self.connect_to_endpoint(node.ws_endpoint());
    }

    /// Use a websocket endpoint given as `host:port`
    pub fn connect_to_endpoint(&mut self, endpoint: impl Into<String>) {
        self.connected_node = Some(endpoint.into());
    }

    pub fn set_http_server_port(&mut self, port: u16) {
        self.http_server_port = Some(port);
    }

    pub fn set_executable_file_path(&mut self, path: impl Into<PathBuf>) {
        self.executable = Some(path.into());
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn http_endpoint(&self) -> Option<String> {
        self.http_server_port.map(|port| format!("http://127.0.0.1:{}", port))
    }

    pub fn stderr_path(&self) -> PathBuf {
        self.directory.join(LogStream::Stderr.file_name())
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn is_running(&mut self) -> bool {
        let running = self.process.as_mut().is_some_and(ProcessHandle::is_running);
        if !running && self.state == ProcessState::Running {
            self.state = ProcessState::Stopped;
            self.rpc = None;
        }
        running
    }

    /// Start the wallet, then set its password, unlock it and import the
    /// `initminer` key.
    pub fn run(&mut self, context: &Context) -> Result<(), ProcessError> {
        if self.process.is_some() {
            return Err(ProcessError::Precondition(format!("{} is already running", self.name)));
        }

        let executable = match &self.executable {
            Some(path) => path.clone(),
            None => context.paths.get_path_of(CLI_WALLET)?,
        };
        let node = self.connected_node.clone().ok_or_else(|| {
            ProcessError::Precondition(
                "Server websocket RPC endpoint not set (node not set), use Wallet::connect_to".to_string(),
            )
        })?;
        let port = self.http_server_port.ok_or_else(|| {
            ProcessError::Precondition(
                "Http server port not set (port not set), use Wallet::set_http_server_port".to_string(),
            )
        })?;

        wait_for_listener(&node, context.timeouts.readiness, context.timeouts.poll_interval)?;

        let arguments = [
            format!("--chain-id={}", TESTNET_CHAIN_ID),
            "-s".to_string(),
            format!("ws://{}", node),
            "-d".to_string(),
            "-H".to_string(),
            format!("0.0.0.0:{}", port),
            "--rpc-http-allowip".to_string(),
            "192.168.10.10".to_string(),
            "--rpc-http-allowip=127.0.0.1".to_string(),
        ];

        let mut process = ProcessHandle::spawn(&*self.name, &executable, &arguments, &self.directory)?
            .with_close_timeout(context.timeouts.close);
        process.wait_for_marker(
            LogStream::Stderr,
            READY_MARKER,
            context.timeouts.readiness,
            context.timeouts.poll_interval,
        )?;

        let rpc = RpcClient::new(format!("http://127.0.0.1:{}", port))?;
        process.handshake(
            context.timeouts.handshake_attempts,
            context.timeouts.handshake_interval,
            || WalletApi::new(&rpc).info(),
        )?;

        let api = WalletApi::new(&rpc);
        api.set_password(&self.password)?;
        api.unlock(&self.password)?;
        api.import_key(&Account::initminer().private_key)?;

        info!("{} started, listening on port {}", self.name, port);
        self.process = Some(process);
        self.rpc = Some(rpc);
        self.state = ProcessState::Running;
        Ok(())
    }

    pub fn api(&self) -> Result<WalletApi<'_>, ProcessError> {
        self.rpc
            .as_ref()
            .map(WalletApi::new)
            .ok_or_else(|| ProcessError::Precondition(format!("{} is not running", self.name)))
    }

    /// Create `name` with keys derived by `get_dev_key` and import its
    /// private key.
    pub fn create_account(&self, context: &Context, name: &str, creator: &str) -> Result<Account, ProcessError> {
        let account = Account::generate(&context.paths, name)?;
        let api = self.api()?;
        let key = account.public_key.as_str();
        api.create_account_with_keys(creator, &account.name, "", key, key, key, key, true)?;
        api.import_key(&account.private_key)?;
        info!("{} created account {}", self.name, account.name);
        Ok(account)
    }

    /// Stop the wallet process. Returns `None` when it was not running.
    pub fn close(&mut self) -> Option<CloseOutcome> {
        self.rpc = None;
        let outcome = self.process.take().and_then(|mut process| process.close());
        if outcome.is_some() {
            self.state = ProcessState::Stopped;
        }
        outcome
    }
}

/// Wait until something accepts TCP connections on `endpoint`
fn wait_for_listener(endpoint: &str, timeout: Duration, poll_interval: Duration) -> Result<(), ProcessError> {
    let deadline = Instant::now() + timeout;
    let mut announced = false;
    loop {
        if TcpStream::connect(endpoint).is_ok() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(ProcessError::Precondition(format!(
                "Nothing listens on {} after {:?}",
                endpoint, timeout
            )));
        }
        if !announced {
            info!("Waiting for node {} to listen...", endpoint);
            announced = true;
        }
        debug!("{} not listening yet", endpoint);
        thread::sleep(poll_interval);
    }
}
