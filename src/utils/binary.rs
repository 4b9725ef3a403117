//! Executable path resolution and validation utilities.
//!
//! Every executable the harness starts is known by a logical name. Its path
//! is looked up, in order, in:
//!
//! 1. explicit overrides installed with [`PathsToExecutables::set_path_of`],
//! 2. command-line arguments `--<name-with-dashes>-path <path>`,
//! 3. environment variables `<NAME>_PATH` (with `$VAR` expansion),
//! 4. the system `PATH`.

use crate::utils::expand::expand_variables;
use log::warn;
use std::collections::BTreeMap;
use std::env;
use std::ffi::OsStr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Variable users are asked to point at their build directory
const BUILD_PATH_VARIABLE: &str = "HIVE_BUILD_PATH";

/// Errors that can occur during executable resolution or validation
#[derive(Debug, thiserror::Error)]
pub enum BinaryError {
    #[error("Executable {name} is not supported")]
    UnsupportedExecutable { name: String },

    #[error("Missing path to {name}")]
    PathNotFound { name: String },

    #[error("Binary not found: {path}")]
    NotFound { path: String },

    #[error("Binary is not executable: {path}")]
    NotExecutable { path: String },

    #[error("Invalid path: {path}")]
    InvalidPath { path: String },
}

/// Static description of one supported executable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutableDescriptor {
    pub name: &'static str,
    /// Location relative to a build directory, used in the configuration hint
    pub default_path_from_build: &'static str,
}

impl ExecutableDescriptor {
    /// Command-line flag, e.g. `--cli-wallet-path`
    pub fn argument(&self) -> String {
        format!("--{}-path", self.name.replace('_', "-"))
    }

    /// Environment variable, e.g. `CLI_WALLET_PATH`
    pub fn environment_variable(&self) -> String {
        format!("{}_PATH", self.name).to_uppercase()
    }
}

pub const HIVED: &str = "hived";
pub const CLI_WALLET: &str = "cli_wallet";
pub const GET_DEV_KEY: &str = "get_dev_key";

pub static SUPPORTED_EXECUTABLES: [ExecutableDescriptor; 3] = [
    ExecutableDescriptor {
        name: HIVED,
        default_path_from_build: "programs/hived/hived",
    },
    ExecutableDescriptor {
        name: CLI_WALLET,
        default_path_from_build: "programs/cli_wallet/cli_wallet",
    },
    ExecutableDescriptor {
        name: GET_DEV_KEY,
        default_path_from_build: "programs/util/get_dev_key",
    },
];

fn descriptor_of(name: &str) -> Result<&'static ExecutableDescriptor, BinaryError> {
    SUPPORTED_EXECUTABLES
        .iter()
        .find(|executable| executable.name == name)
        .ok_or_else(|| BinaryError::UnsupportedExecutable {
            name: name.to_string(),
        })
}

/// Paths to the executables used by the harness.
///
/// Instances are built explicitly and handed to whatever needs them; tests
/// start from [`PathsToExecutables::empty`] and fill in only the sources they
/// exercise.
#[derive(Debug, Clone, Default)]
pub struct PathsToExecutables {
    overrides: BTreeMap<&'static str, PathBuf>,
    command_line_arguments: BTreeMap<&'static str, PathBuf>,
    environment_variables: BTreeMap<&'static str, PathBuf>,
    installed_executables: BTreeMap<&'static str, PathBuf>,
}

impl PathsToExecutables {
    /// Resolver with no sources at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolver reading this process' arguments, environment and `PATH`
    pub fn from_process() -> Self {
        let mut paths = Self::from_environment();
        let arguments: Vec<String> = env::args().skip(1).collect();
        paths.parse_command_line_arguments(&arguments);
        paths
    }

    /// Resolver reading only the environment and `PATH`
    pub fn from_environment() -> Self {
        let mut paths = Self::empty();
        paths.set_environment_variables(env::vars());
        if let Some(search_path) = env::var_os("PATH") {
            paths.discover_installed_executables(&search_path);
        }
        paths
    }

    /// Pick `--<name>-path` flags out of `arguments`, ignoring everything else.
    ///
    /// Both `--flag value` and `--flag=value` are understood.
    pub fn parse_command_line_arguments<S: AsRef<str>>(&mut self, arguments: &[S]) {
        self.command_line_arguments.clear();

        let arguments: Vec<&str> = arguments.iter().map(|argument| argument.as_ref()).collect();
        let mut iter = arguments.into_iter().peekable();
        while let Some(argument) = iter.next() {
            for executable in &SUPPORTED_EXECUTABLES {
                let flag = executable.argument();
                if argument == flag {
                    if let Some(value) = iter.next_if(|next| !next.starts_with("--")) {
                        self.command_line_arguments.insert(executable.name, PathBuf::from(value));
                    }
                } else if let Some(value) = argument.strip_prefix(&format!("{}=", flag)) {
                    self.command_line_arguments.insert(executable.name, PathBuf::from(value));
                }
            }
        }
    }

    /// Take `<NAME>_PATH` values from `variables`.
    ///
    /// `$VAR` references inside the values are expanded against `variables`
    /// themselves.
    pub fn set_environment_variables<I, K, V>(&mut self, variables: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let variables: BTreeMap<String, String> = variables
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        self.environment_variables.clear();
        for executable in &SUPPORTED_EXECUTABLES {
            if let Some(value) = variables.get(&executable.environment_variable()) {
                let expanded = expand_variables(value, |name| variables.get(name).cloned());
                self.environment_variables.insert(executable.name, PathBuf::from(expanded));
            }
        }
    }

    /// Look every supported executable up in a `PATH`-style search list.
    pub fn discover_installed_executables(&mut self, search_path: &OsStr) {
        self.installed_executables.clear();
        for executable in &SUPPORTED_EXECUTABLES {
            if let Some(path) = find_on_search_path(executable.name, search_path) {
                self.installed_executables.insert(executable.name, path);
            }
        }
    }

    /// Install an override that wins over every other source.
    pub fn set_path_of(&mut self, name: &str, path: impl Into<PathBuf>) -> Result<(), BinaryError> {
        let executable = descriptor_of(name)?;
        self.overrides.insert(executable.name, path.into());
        Ok(())
    }

    /// Resolve the path of a supported executable.
    pub fn get_path_of(&self, name: &str) -> Result<PathBuf, BinaryError> {
        let executable = descriptor_of(name)?;

        let sources = [
            &self.overrides,
            &self.command_line_arguments,
            &self.environment_variables,
            &self.installed_executables,
        ];
        if let Some(path) = sources.iter().find_map(|source| source.get(executable.name)) {
            return Ok(path.clone());
        }

        warn!("{}", Self::configuration_hint());
        Err(BinaryError::PathNotFound {
            name: name.to_string(),
        })
    }

    /// Instructions for setting up paths through `/etc/environment`
    pub fn configuration_hint() -> String {
        let mut lines = vec![
            format!(
                "Edit {} below, add following lines to /etc/environment and restart computer.",
                BUILD_PATH_VARIABLE
            ),
            String::new(),
            format!("{}= # Should be something like: '/home/dev/hive/build'", BUILD_PATH_VARIABLE),
        ];
        for executable in &SUPPORTED_EXECUTABLES {
            lines.push(format!(
                "{}='${{{}}}/{}'",
                executable.environment_variable(),
                BUILD_PATH_VARIABLE,
                executable.default_path_from_build
            ));
        }
        lines.join("\n")
    }

    /// Resolution result of every supported executable
    pub fn paths_in_use(&self) -> Vec<(&'static str, Result<PathBuf, BinaryError>)> {
        SUPPORTED_EXECUTABLES
            .iter()
            .map(|executable| (executable.name, self.get_path_of(executable.name)))
            .collect()
    }
}

/// Find an executable file called `name` in a `PATH`-style list
pub fn find_on_search_path(name: &str, search_path: &OsStr) -> Option<PathBuf> {
    env::split_paths(search_path)
        .map(|directory| directory.join(name))
        .find(|candidate| validate_binary(candidate).is_ok())
}

/// Validate that a binary exists and is executable.
pub fn validate_binary(path: &Path) -> Result<(), BinaryError> {
    if !path.is_file() {
        return Err(BinaryError::NotFound {
            path: path.display().to_string(),
        });
    }

    let metadata = path.metadata().map_err(|_| BinaryError::InvalidPath {
        path: path.display().to_string(),
    })?;

    // Check if file is executable (any execute bit set)
    if metadata.permissions().mode() & 0o111 == 0 {
        return Err(BinaryError::NotExecutable {
            path: path.display().to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_executable(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_descriptor_names() {
        let wallet = descriptor_of(CLI_WALLET).unwrap();
        assert_eq!(wallet.argument(), "--cli-wallet-path");
        assert_eq!(wallet.environment_variable(), "CLI_WALLET_PATH");
    }

    #[test]
    fn test_unsupported_executable() {
        let mut paths = PathsToExecutables::empty();
        assert!(matches!(
            paths.get_path_of("geth"),
            Err(BinaryError::UnsupportedExecutable { .. })
        ));
        assert!(matches!(
            paths.set_path_of("geth", "/usr/bin/geth"),
            Err(BinaryError::UnsupportedExecutable { .. })
        ));
    }

    #[test]
    fn test_missing_paths() {
        let paths = PathsToExecutables::empty();
        for executable in &SUPPORTED_EXECUTABLES {
            assert!(matches!(
                paths.get_path_of(executable.name),
                Err(BinaryError::PathNotFound { .. })
            ));
        }
    }

    #[test]
    fn test_command_line_arguments_paths() {
        for executable in &SUPPORTED_EXECUTABLES {
            let mut paths = PathsToExecutables::empty();
            let path = format!("/opt/hive/{}", executable.name);
            paths.parse_command_line_arguments(&[executable.argument(), path.clone()]);
            assert_eq!(paths.get_path_of(executable.name).unwrap(), PathBuf::from(path));
        }
    }

    #[test]
    fn test_equals_form_and_unknown_arguments() {
        let mut paths = PathsToExecutables::empty();
        paths.parse_command_line_arguments(&[
            "-k",
            "wallet",
            "--hived-path=/srv/hived",
            "--cli-wallet-path",
            "--verbose",
        ]);
        assert_eq!(paths.get_path_of(HIVED).unwrap(), PathBuf::from("/srv/hived"));
        // A flag without a value does not swallow the next flag
        assert!(paths.get_path_of(CLI_WALLET).is_err());
    }

    #[test]
    fn test_command_line_wins_over_environment() {
        let mut paths = PathsToExecutables::empty();
        paths.set_environment_variables([("HIVED_PATH", "/from/env/hived")]);
        paths.parse_command_line_arguments(&["--hived-path", "/from/cli/hived"]);
        assert_eq!(paths.get_path_of(HIVED).unwrap(), PathBuf::from("/from/cli/hived"));
    }

    #[test]
    fn test_environment_is_expanded() {
        let mut paths = PathsToExecutables::empty();
        paths.set_environment_variables([
            ("HIVE_BUILD_PATH", "/home/dev/hive/build"),
            ("GET_DEV_KEY_PATH", "${HIVE_BUILD_PATH}/programs/util/get_dev_key"),
        ]);
        assert_eq!(
            paths.get_path_of(GET_DEV_KEY).unwrap(),
            PathBuf::from("/home/dev/hive/build/programs/util/get_dev_key")
        );
    }

    #[test]
    fn test_search_path_is_last_resort() {
        let dir = TempDir::new().unwrap();
        let installed = write_executable(dir.path(), HIVED);
        let search_path = env::join_paths([dir.path()]).unwrap();

        let mut paths = PathsToExecutables::empty();
        paths.discover_installed_executables(&search_path);
        assert_eq!(paths.get_path_of(HIVED).unwrap(), installed);
        assert!(paths.get_path_of(CLI_WALLET).is_err());

        paths.set_environment_variables([("HIVED_PATH", "/from/env/hived")]);
        assert_eq!(paths.get_path_of(HIVED).unwrap(), PathBuf::from("/from/env/hived"));
    }

    #[test]
    fn test_override_is_sticky() {
        let mut paths = PathsToExecutables::empty();
        paths.parse_command_line_arguments(&["--hived-path", "/from/cli/hived"]);
        paths.set_path_of(HIVED, "/override/hived").unwrap();
        assert_eq!(paths.get_path_of(HIVED).unwrap(), PathBuf::from("/override/hived"));

        paths.parse_command_line_arguments(&["--hived-path", "/other/hived"]);
        assert_eq!(paths.get_path_of(HIVED).unwrap(), PathBuf::from("/override/hived"));
    }

    #[test]
    fn test_non_executable_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(HIVED), "data").unwrap();
        let search_path = env::join_paths([dir.path()]).unwrap();
        assert!(find_on_search_path(HIVED, &search_path).is_none());
    }

    #[test]
    fn test_configuration_hint_lists_every_executable() {
        let hint = PathsToExecutables::configuration_hint();
        assert!(hint.contains("HIVED_PATH='${HIVE_BUILD_PATH}/programs/hived/hived'"));
        assert!(hint.contains("CLI_WALLET_PATH="));
        assert!(hint.contains("GET_DEV_KEY_PATH="));
    }
}
