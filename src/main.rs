use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use hivenet::config_loader::load_config;
use hivenet::settings::HarnessConfig;
use hivenet::topology::NetworksArchitecture;
use hivenet::utils::binary::{BinaryError, PathsToExecutables, CLI_WALLET, GET_DEV_KEY, HIVED};
use hivenet::world::World;
use log::info;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Test harness for multi-node Hive networks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    executables: ExecutableArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the networks described by a settings file
    Show {
        /// Path to the harness settings YAML file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print the executables the harness would start
    Paths {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Build and start the described networks, then tear them down
    ///
    /// Every pair of networks is connected before the nodes start.
    Run {
        #[arg(short, long)]
        config: PathBuf,

        /// Seconds to keep the networks running
        #[arg(long, default_value_t = 0)]
        hold: u64,
    },
}

/// Paths of executables, winning over settings file and environment
#[derive(Args, Debug, Default)]
struct ExecutableArgs {
    #[arg(long, global = true)]
    hived_path: Option<PathBuf>,

    #[arg(long, global = true)]
    cli_wallet_path: Option<PathBuf>,

    #[arg(long, global = true)]
    get_dev_key_path: Option<PathBuf>,
}

impl ExecutableArgs {
    fn apply(&self, paths: &mut PathsToExecutables) -> Result<(), BinaryError> {
        let given = [
            (HIVED, &self.hived_path),
            (CLI_WALLET, &self.cli_wallet_path),
            (GET_DEV_KEY, &self.get_dev_key_path),
        ];
        for (name, path) in given {
            if let Some(path) = path {
                paths.set_path_of(name, path)?;
            }
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let cli = Cli::parse();

    // Settings are read before logging starts, they may choose the level
    let config = match cli.command.config_path() {
        Some(path) => Some(read_config(path)?),
        None => None,
    };
    let level = config
        .as_ref()
        .and_then(|config| config.general.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("Starting hivenet v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Command::Show { .. } => {
            let architecture = architecture_of(config.as_ref())?;
            println!("{}", architecture);
            info!("{} node(s) declared", architecture.nodes_number);
        }
        Command::Paths { .. } => {
            let config = config.unwrap_or_default();
            let world = world_of(&config, &cli.executables)?;
            for (name, path) in world.context().paths.paths_in_use() {
                println!("Name: {}", name);
                match path {
                    Ok(path) => println!("Path: {}", path.display()),
                    Err(e) => println!("Path: <{}>", e),
                }
            }
        }
        Command::Run { hold, .. } => {
            let architecture = architecture_of(config.as_ref())?;
            let config = config.unwrap_or_default();
            let mut world = world_of(&config, &cli.executables)?;

            let witnesses = world.build(&architecture)?;
            info!("Built {} network(s) with {} witness(es)", world.networks().len(), witnesses.len());

            let names: Vec<String> = world.networks().iter().map(|n| n.name().to_string()).collect();
            for (index, first) in names.iter().enumerate() {
                for second in &names[index + 1..] {
                    world.connect(first, second)?;
                }
            }

            world.run().wrap_err("Failed to start the networks")?;
            println!("{}", architecture);

            if *hold > 0 {
                info!("Holding networks for {}s", hold);
                thread::sleep(Duration::from_secs(*hold));
            }
            world.close();
            info!("All networks closed");
        }
    }

    Ok(())
}

impl Command {
    fn config_path(&self) -> Option<&Path> {
        match self {
            Command::Show { config } | Command::Run { config, .. } => Some(config.as_path()),
            Command::Paths { config } => config.as_deref(),
        }
    }
}

fn read_config(path: &Path) -> Result<HarnessConfig> {
    load_config(path).wrap_err_with(|| format!("Invalid settings file {}", path.display()))
}

fn architecture_of(config: Option<&HarnessConfig>) -> Result<NetworksArchitecture> {
    let topology = config
        .and_then(|config| config.topology.as_ref())
        .ok_or_else(|| eyre!("The settings file declares no topology"))?;
    Ok(NetworksArchitecture::load(topology))
}

fn world_of(config: &HarnessConfig, executables: &ExecutableArgs) -> Result<World> {
    let mut world = World::from_config(config, PathsToExecutables::from_environment())?;
    executables.apply(&mut world.context_mut().paths)?;
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["hivenet", "run", "--config", "net.yaml", "--hold", "30"]);
        match cli.command {
            Command::Run { config, hold } => {
                assert_eq!(config, PathBuf::from("net.yaml"));
                assert_eq!(hold, 30);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_executable_flags() {
        let cli = Cli::parse_from(["hivenet", "paths", "--hived-path", "/opt/hived"]);
        assert!(cli.command.config_path().is_none());

        let mut paths = PathsToExecutables::empty();
        cli.executables.apply(&mut paths).unwrap();
        assert_eq!(paths.get_path_of(HIVED).unwrap(), PathBuf::from("/opt/hived"));
        assert!(paths.get_path_of(CLI_WALLET).is_err());
    }
}
