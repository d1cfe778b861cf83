use anyhow::Result;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::AppConfig;
use crate::core::paths;

const CONFIG_FILE: &str = "config.json";

/// Returns the configuration directory, honoring an explicit override.
pub fn get_config_directory(dir_override: Option<&Path>) -> Option<PathBuf> {
    paths::config_dir(dir_override)
}

/// Returns the full path to the configuration file.
pub fn get_config_file_path(dir_override: Option<&Path>) -> Option<PathBuf> {
    get_config_directory(dir_override).map(|dir| dir.join(CONFIG_FILE))
}

/// Loads the application configuration from the config file.
///
/// If the file doesn't exist, a default one is written. If it cannot be
/// parsed, missing fields are filled from the defaults; if even that fails the
/// defaults are used, so a broken file never prevents startup.
pub fn load_config(dir_override: Option<&Path>) -> Result<AppConfig> {
    let config_path = get_config_file_path(dir_override)
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    if !config_path.exists() {
        tracing::info!(
            "Config file not found, creating default config at {:?}",
            config_path
        );
        let default_config = AppConfig::default();
        save_config(&default_config, dir_override)?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&config_path)?;

    match serde_json::from_str::<AppConfig>(&config_content) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse config file at {:?}: {}. Trying to migrate.",
                config_path,
                e
            );
            migrate_legacy_config(&config_content).or_else(|e| {
                tracing::warn!("Migration failed ({}). Falling back to default config.", e);
                Ok(AppConfig::default())
            })
        }
    }
}

/// Fills fields that older versions did not write (or wrote as `null`) with
/// their defaults and re-parses.
fn migrate_legacy_config(config_content: &str) -> Result<AppConfig> {
    let mut value: Value = serde_json::from_str(config_content)?;
    let obj = value
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Config is not a JSON object"))?;

    let defaults = serde_json::to_value(AppConfig::default())?;
    let defaults = defaults
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("Default config is not a JSON object"))?;

    for (key, default_val) in defaults {
        let missing = obj.get(key).map_or(true, Value::is_null);
        // Optional fields default to `null`, which serde already accepts.
        if missing && !default_val.is_null() {
            obj.insert(key.clone(), default_val.clone());
        }
    }

    let migrated_config: AppConfig = serde_json::from_value(value)?;
    tracing::info!("Successfully migrated legacy config");
    Ok(migrated_config)
}

/// Saves the provided configuration to the config file.
pub fn save_config(config: &AppConfig, dir_override: Option<&Path>) -> Result<()> {
    let config_dir = get_config_directory(dir_override)
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
        tracing::info!("Created config directory: {:?}", config_dir);
    }

    let config_path = config_dir.join(CONFIG_FILE);
    let config_json = serde_json::to_string_pretty(config)?;

    fs::write(&config_path, config_json)?;
    tracing::debug!("Saved config to {:?}", config_path);

    Ok(())
}

// Platform-specific configuration paths for reference:
// macOS:   ~/Library/Application Support/com.bakaru.Bakaru/
// Linux:   ~/.config/bakaru/
// Windows: %APPDATA%/bakaru/Bakaru/config/
