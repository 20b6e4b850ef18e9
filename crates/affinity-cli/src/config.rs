//! Configuration and path resolution for the CLI.
//!
//! Handles finding the data directory that holds the cluster database and
//! loading the optional engine config file.

use affinity_core::config::EngineConfig;
use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Cluster database file name
const DATABASE_FILENAME: &str = "clusters.redb";

/// Environment variable for a custom data directory
const DATA_DIR_ENV: &str = "AFFINITY_DATA_DIR";

/// Returns the data directory.
///
/// Search order:
/// 1. `--data-dir` flag
/// 2. `$AFFINITY_DATA_DIR` environment variable
/// 3. Platform data directory:
///    - macOS: `~/Library/Application Support/dev.affinity.Affinity/`
///    - Linux: `~/.local/share/affinity/`
///    - Windows: `%APPDATA%\affinity\Affinity\data\`
pub fn get_data_dir(custom_dir: Option<&PathBuf>) -> Result<PathBuf> {
    resolve_data_dir(custom_dir, std::env::var(DATA_DIR_ENV).ok())
}

fn resolve_data_dir(custom_dir: Option<&PathBuf>, env_dir: Option<String>) -> Result<PathBuf> {
    if let Some(dir) = custom_dir {
        return Ok(dir.clone());
    }

    if let Some(dir) = env_dir.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    ProjectDirs::from("dev", "affinity", "Affinity")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine data directory"))
}

/// Returns the path to the cluster database file.
pub fn database_path(custom_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let data_dir = get_data_dir(custom_dir)?;
    Ok(data_dir.join(DATABASE_FILENAME))
}

/// Loads the engine configuration.
///
/// Without a file the defaults are used. Fields missing from the file keep
/// their default values.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    EngineConfig::from_json(&json)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use affinity_core::config::DEFAULT_LEARNING_RATE;
    use tempfile::TempDir;

    #[test]
    fn test_custom_data_dir_wins() {
        let custom = PathBuf::from("/tmp/custom-data");
        let dir = resolve_data_dir(Some(&custom), Some("/tmp/from-env".to_string())).unwrap();
        assert_eq!(dir, custom);
    }

    #[test]
    fn test_env_data_dir() {
        let dir = resolve_data_dir(None, Some("/tmp/from-env".to_string())).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/from-env"));
    }

    #[test]
    fn test_platform_data_dir() {
        let dir = resolve_data_dir(None, None).unwrap();
        let dir_str = dir.to_string_lossy().to_lowercase();
        assert!(dir_str.contains("affinity"), "unexpected data dir: {}", dir_str);
    }

    #[test]
    fn test_database_path() {
        let custom = PathBuf::from("/tmp/custom-data");
        let path = database_path(Some(&custom)).unwrap();
        assert_eq!(path, custom.join("clusters.redb"));
    }

    #[test]
    fn test_config_defaults_without_file() {
        assert_eq!(load_engine_config(None).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "clustering": { "vigilance": 0.75 } }"#).unwrap();

        let config = load_engine_config(Some(&path)).unwrap();
        assert_eq!(config.clustering.vigilance, 0.75);
        assert_eq!(config.clustering.learning_rate, DEFAULT_LEARNING_RATE);
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "clustering": { "vigilance": 1.5 } }"#).unwrap();

        let err = load_engine_config(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("vigilance"));
    }

    #[test]
    fn test_missing_config_file() {
        let err = load_engine_config(Some(Path::new("/nonexistent/engine.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
