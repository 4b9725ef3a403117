//! # Hivenet - Test harness for multi-node Hive networks
//!
//! This library starts `hived` nodes and `cli_wallet` instances, arranges
//! them into peer-to-peer networks and drives them through JSON-RPC, so that
//! tests can assert on behavior that only shows up with several nodes:
//! forks, network splits and merges, witness scheduling.
//!
//! ## Overview
//!
//! A test describes the networks it needs, the harness builds and starts
//! them, and everything is stopped again when the [`world::World`] owning
//! them goes out of scope.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `node_config`: Typed `config.ini` entries and the node config schema
//! - `utils`: Executable path resolution and variable expansion
//! - `settings` / `config_loader`: Harness settings YAML format and loading
//! - `ports`: Per-worker port windows
//! - `rpc`: Blocking JSON-RPC client and per-process call builders
//! - `account`: Built-in and derived accounts
//! - `process`: Process lifecycle, nodes and wallets
//! - `topology`: Network descriptions, builder and peer links
//! - `context` / `world`: Shared harness state and the scope owning networks
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use hivenet::config_loader::load_config;
//! use hivenet::topology::NetworksArchitecture;
//! use hivenet::utils::binary::PathsToExecutables;
//! use hivenet::world::World;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("hivenet.yaml"))?;
//! let architecture = NetworksArchitecture::load(config.topology.as_ref().unwrap());
//!
//! let mut world = World::from_config(&config, PathsToExecutables::from_process())?;
//! world.build(&architecture)?;
//! world.connect("Network-alpha", "Network-beta")?;
//! world.run()?;
//!
//! let wallet = world.attach_wallet("ApiNode0")?;
//! wallet.api()?.info()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Settings Format
//!
//! ```yaml
//! general:
//!   worker_id: 0
//!   log_level: info
//!
//! timeouts:
//!   readiness: "90s"
//!   close: "3s"
//!
//! topology:
//!   networks:
//!     - InitNode: true
//!       ApiNode: true
//!       WitnessNodes: [1, 2]
//!     - ApiNode: true
//!       WitnessNodes: [3]
//! ```
//!
//! ## Error Handling
//!
//! Library modules return their own `thiserror` error enums; the binary
//! wraps them with `color_eyre` for reporting with context.

pub mod account;
pub mod config_loader;
pub mod context;
pub mod node_config;
pub mod ports;
pub mod process;
pub mod rpc;
pub mod settings;
pub mod topology;
pub mod utils;
pub mod world;
