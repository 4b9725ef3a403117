use crate::settings::HarnessConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and parse harness settings from a YAML file
pub fn load_config(config_path: &Path) -> Result<HarnessConfig> {
    info!("Loading configuration from: {:?}", config_path);

    // Open the configuration file
    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open {}", config_path.display()))?;

    // Parse the YAML content
    let config: HarnessConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse {}", config_path.display()))?;

    if let Some(topology) = &config.topology {
        info!("Configuration declares {} network(s)", topology.networks.len());
    }

    // Validate the configuration
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_topology_config() {
        let yaml = r#"
general:
  working_directory: "generated/smoke"
  worker_id: 1
timeouts:
  close: "5s"
executables:
  hived: "/opt/hive/hived"
topology:
  networks:
    - InitNode: true
      ApiNode: true
      WitnessNodes: [1, 2]
    - WitnessNodes: [3]
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.general.worker_id, Some(1));
        assert_eq!(config.timeouts.close, Duration::from_secs(5));
        assert_eq!(config.executables["hived"], PathBuf::from("/opt/hive/hived"));
        assert_eq!(config.topology.unwrap().networks.len(), 2);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let yaml = r#"
topology:
  networks:
    - WitnessNodes: [0]
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        assert!(load_config(temp_file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/hivenet.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }
}
