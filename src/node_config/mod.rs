//! Node configuration file (`config.ini`).
//!
//! The file is a sequence of `key = value` lines. [`NodeConfig`] has a fixed
//! schema of typed entries; lines are written in schema order regardless of
//! the order in which test code filled the entries, and keys unknown to the
//! schema are skipped when reading so newer node versions do not break the
//! harness.

pub mod entry_types;

use entry_types::{Boolean, ConfigEntry, Entry, EntryError, Integer, List, Quoted, Untouched};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while reading or writing a node configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Line {line}: invalid value for '{key}': {source}")]
    InvalidEntry {
        line: usize,
        key: String,
        #[source]
        source: EntryError,
    },

    #[error("Cannot access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

macro_rules! node_config_schema {
    ($( $(#[$meta:meta])* $field:ident : $ty:ty = $init:expr ),* $(,)?) => {
        /// Settings of a single node, one field per config key
        #[derive(Debug, Clone, PartialEq)]
        pub struct NodeConfig {
            $( $(#[$meta])* pub $field: $ty, )*
        }

        impl Default for NodeConfig {
            fn default() -> Self {
                Self { $( $field: $init, )* }
            }
        }

        impl NodeConfig {
            fn entries(&self) -> Vec<(&'static str, &dyn ConfigEntry)> {
                vec![ $( (stringify!($field), &self.$field as &dyn ConfigEntry), )* ]
            }

            fn entries_mut(&mut self) -> Vec<(&'static str, &mut dyn ConfigEntry)> {
                vec![ $( (stringify!($field), &mut self.$field as &mut dyn ConfigEntry), )* ]
            }
        }
    };
}

node_config_schema! {
    /// JSON appender definitions, one per line
    log_appender: List<Untouched> = List::multi_line(),
    log_logger: List<Untouched> = List::multi_line(),
    plugin: List<Untouched> = List::new(),
    shared_file_dir: Entry<Quoted> = Entry::new(),
    /// e.g. `6G`
    shared_file_size: Entry<Untouched> = Entry::new(),
    p2p_endpoint: Entry<Untouched> = Entry::new(),
    /// Space separated `host:port` list
    p2p_seed_node: List<Untouched> = List::new(),
    webserver_http_endpoint: Entry<Untouched> = Entry::new(),
    webserver_ws_endpoint: Entry<Untouched> = Entry::new(),
    enable_stale_production: Entry<Boolean> = Entry::new(),
    required_participation: Entry<Integer> = Entry::new(),
    witness_skip_enforce_bandwidth: Entry<Boolean> = Entry::new(),
    /// Witness account names produced by this node
    witness: List<Quoted> = List::multi_line(),
    /// WIF keys used to sign blocks, one `private-key` line each
    private_key: List<Untouched> = List::multi_line(),
    market_history_bucket_size: List<Integer> = List::bracketed("[", ",", "]"),
    market_history_buckets_per_size: Entry<Integer> = Entry::new(),
    account_history_rocksdb_path: Entry<Quoted> = Entry::new(),
}

/// Config file key of a schema field (`private_key` -> `private-key`)
fn key_of(field: &str) -> String {
    field.replace('_', "-")
}

impl NodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render every set entry as `key = value` lines in schema order.
    pub fn write_to_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (field, entry) in self.entries() {
            let key = key_of(field);
            for value in entry.to_lines() {
                lines.push(format!("{} = {}", key, value));
            }
        }
        lines
    }

    pub fn write_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let mut content = self.write_to_lines().join("\n");
        content.push('\n');
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build a config from file lines.
    ///
    /// Blank lines and `#` comments are skipped, unknown keys are ignored,
    /// repeated list keys accumulate and repeated scalar keys keep the last
    /// value. Nothing is returned unless every line parses.
    pub fn load_from_lines<I, S>(lines: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::default();

        for (index, line) in lines.into_iter().enumerate() {
            let line_number = index + 1;
            let line = line.as_ref().trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::Parse {
                line: line_number,
                reason: format!("expected `key = value`, found {:?}", line),
            })?;
            let key = key.trim();
            let value = value.trim();

            match config.entry_mut(key) {
                Some(entry) => entry.merge_from_text(value).map_err(|source| ConfigError::InvalidEntry {
                    line: line_number,
                    key: key.to_string(),
                    source,
                })?,
                None => debug!("Ignoring unknown config key '{}' on line {}", key, line_number),
            }
        }

        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_from_lines(content.lines())
    }

    /// Keys of the schema in declaration order
    pub fn keys(&self) -> Vec<String> {
        self.entries().into_iter().map(|(field, _)| key_of(field)).collect()
    }

    fn entry_mut(&mut self, key: &str) -> Option<&mut dyn ConfigEntry> {
        self.entries_mut()
            .into_iter()
            .find(|(field, _)| key_of(field) == key)
            .map(|(_, entry)| entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_single_entry_serialization() {
        let mut config = NodeConfig::new();
        config.required_participation.set_value(0).unwrap();
        let lines = config.write_to_lines();
        assert!(lines.contains(&"required-participation = 0".to_string()));
    }

    #[test]
    fn test_multi_line_list_entry_serialization() {
        let mut config = NodeConfig::new();
        config.private_key.extend(["A", "B"]).unwrap();
        let lines = config.write_to_lines();
        assert_eq!(lines[0], "private-key = A");
        assert_eq!(lines[1], "private-key = B");
    }

    #[test]
    fn test_single_line_list_entry_serialization() {
        let mut config = NodeConfig::new();
        config.plugin.extend(["p2p", "witness"]).unwrap();
        let lines = config.write_to_lines();
        assert_eq!(lines[0], "plugin = p2p witness");
    }

    #[test]
    fn test_empty_config_renders_nothing() {
        assert!(NodeConfig::new().write_to_lines().is_empty());
    }

    #[test]
    fn test_lines_follow_schema_order() {
        let mut config = NodeConfig::new();
        config.private_key.push("5K").unwrap();
        config.required_participation.set(0);
        config.plugin.push("witness").unwrap();

        let lines = config.write_to_lines();
        assert_eq!(
            lines,
            ["plugin = witness", "required-participation = 0", "private-key = 5K"]
        );
    }

    #[test]
    fn test_loading_ignores_unknown_keys() {
        let config = NodeConfig::load_from_lines([
            "# generated",
            "",
            "plugin = p2p witness",
            "some-future-option = 12",
            "witness = \"initminer\"",
            "witness = \"alice\"",
            "required-participation = 33",
            "market-history-bucket-size = [15,60,300]",
        ])
        .unwrap();

        assert_eq!(config.plugin.get_value(), ["p2p", "witness"]);
        assert_eq!(config.witness.get_value(), ["initminer", "alice"]);
        assert_eq!(config.required_participation.get_value(), Some(&33));
        assert_eq!(config.market_history_bucket_size.get_value(), [15, 60, 300]);
    }

    #[test]
    fn test_loading_reports_line_of_malformed_input() {
        let err = NodeConfig::load_from_lines(["plugin = p2p", "no separator here"]).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 2, .. }));

        let err = NodeConfig::load_from_lines(["required-participation = many"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEntry { line: 1, .. }));
    }

    #[test]
    fn test_file_round_trip() {
        let mut config = NodeConfig::new();
        config.plugin.extend(["p2p", "witness", "database_api"]).unwrap();
        config.witness.push("initminer").unwrap();
        config.private_key.push("5JNHfZYKGaomSFvd4NUdQ9qMcEAC43kujbfjueTHpVapX1Kzq2n").unwrap();
        config.enable_stale_production.set(true);
        config.shared_file_size.set_value("1G").unwrap();
        config.webserver_http_endpoint.set_value("0.0.0.0:2001").unwrap();

        let file = NamedTempFile::new().unwrap();
        config.write_to_file(file.path()).unwrap();
        let loaded = NodeConfig::load_from_file(file.path()).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_string_values_stay_on_their_line() {
        let mut config = NodeConfig::new();
        config.shared_file_dir.set_value("my blockchain").unwrap();
        assert!(config.shared_file_dir.set_value("a\nplugin = evil").is_err());

        let loaded = NodeConfig::load_from_lines(config.write_to_lines()).unwrap();
        assert_eq!(loaded.shared_file_dir.get_value().map(String::as_str), Some("my blockchain"));
        assert!(loaded.plugin.is_empty());
    }

    #[test]
    fn test_loading_hand_written_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "p2p-endpoint = 0.0.0.0:2001").unwrap();
        writeln!(file, "shared-file-dir = \"blockchain\"").unwrap();

        let config = NodeConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.p2p_endpoint.get_value().map(String::as_str), Some("0.0.0.0:2001"));
        assert_eq!(config.shared_file_dir.get_value().map(String::as_str), Some("blockchain"));
    }

    #[test]
    fn test_keys_use_dashes() {
        let keys = NodeConfig::new().keys();
        assert_eq!(keys.first().map(String::as_str), Some("log-appender"));
        assert!(keys.iter().all(|key| !key.contains('_')));
    }
}
