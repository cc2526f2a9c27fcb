//! Config file location, load and save.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::types::AppConfig;

pub const CONFIG_FILE_NAME: &str = "hdd-toggle.json";

/// Explicit path if given, otherwise the config file beside the executable.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }

    let exe_dir = std::env::current_exe()?
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine executable directory"))?
        .to_path_buf();
    Ok(exe_dir.join(CONFIG_FILE_NAME))
}

/// Load the config, falling back to defaults when the file is missing or unusable.
pub async fn load_config(path: &Path) -> AppConfig {
    if !path.exists() {
        info!("Config file {:?} not found, using defaults", path);
        return AppConfig::default();
    }

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            warn!("⚠️ Cannot read {:?}: {}. Using defaults.", path, e);
            return AppConfig::default();
        }
    };

    match serde_json::from_str::<AppConfig>(&content) {
        Ok(config) => {
            info!("Loaded configuration from: {:?}", path);
            config.normalize()
        }
        Err(e) => {
            warn!("⚠️ Invalid configuration in {:?}: {}. Using defaults.", path, e);
            AppConfig::default()
        }
    }
}

pub async fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {:?}", path))?;
    info!("Configuration saved to: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.json")).await;
        assert_eq!(config, AppConfig::default());
    }

    #[tokio::test]
    async fn test_malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path).await, AppConfig::default());
    }

    #[tokio::test]
    async fn test_save_then_load_keeps_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = AppConfig::default();
        config.drive.serial_number = "ZX81".to_string();
        config.timing.periodic_check_minutes = 0;
        save_config(&config, &path).await.unwrap();

        let loaded = load_config(&path).await;
        assert_eq!(loaded.drive.serial_number, "ZX81");
        assert_eq!(loaded.timing.periodic_check_minutes, 1);
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = config_path(Some(Path::new("/tmp/custom.json"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom.json"));
    }
}
