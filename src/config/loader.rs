//! Configuration loading with environment-specific overrides.
//!
//! The loader reads a single `dispatch-config.yaml`, detects the active
//! environment, and merges the matching environment section over the base
//! document before deserializing into [`DispatchConfig`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use crate::config::DispatchConfig;
use crate::error::{DispatchError, Result};

/// Environment sections recognized in the config document
const ENVIRONMENT_SECTIONS: &[&str] = &["development", "test", "production"];

/// Global configuration manager singleton
static GLOBAL_CONFIG_MANAGER: OnceLock<Arc<ConfigManager>> = OnceLock::new();

/// Manages configuration loading and environment resolution
#[derive(Debug)]
pub struct ConfigManager {
    config: DispatchConfig,
    environment: String,
    source_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with automatic environment detection
    pub fn load() -> Result<Arc<ConfigManager>> {
        let environment = detect_environment();
        Self::load_with_env(&environment)
    }

    /// Load configuration for an explicit environment.
    ///
    /// Useful for testing without modifying process environment variables.
    pub fn load_with_env(environment: &str) -> Result<Arc<ConfigManager>> {
        match find_config_file() {
            Some(path) => Self::load_from_file(&path, environment),
            None => {
                info!(
                    environment = environment,
                    "No dispatch-config.yaml found, using built-in defaults"
                );
                let mut config = DispatchConfig::default();
                config.environment = environment.to_string();
                config.validate()?;
                Ok(Arc::new(ConfigManager {
                    config,
                    environment: environment.to_string(),
                    source_path: None,
                }))
            }
        }
    }

    /// Load configuration from an explicit file path
    pub fn load_from_file(path: &Path, environment: &str) -> Result<Arc<ConfigManager>> {
        let config = load_and_merge_config(path, environment)?;
        config.validate()?;

        info!(
            path = %path.display(),
            environment = environment,
            database_host = %config.database.host,
            pool_size = config.database.pool,
            "Loaded dispatch configuration"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            source_path: Some(path.to_path_buf()),
        }))
    }

    /// Get or initialize the global configuration manager
    pub fn global() -> Result<Arc<ConfigManager>> {
        if let Some(manager) = GLOBAL_CONFIG_MANAGER.get() {
            return Ok(Arc::clone(manager));
        }

        let manager = Self::load()?;
        // A racing initializer may have won; hand back whichever is installed
        Ok(Arc::clone(GLOBAL_CONFIG_MANAGER.get_or_init(|| manager)))
    }

    /// Access the resolved configuration
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// The environment this configuration was resolved for
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// The file the configuration was loaded from, if any
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }
}

/// Detect the active environment from process environment variables.
///
/// Checks `DISPATCH_ENV` then `APP_ENV`, defaulting to `development`.
pub fn detect_environment() -> String {
    std::env::var("DISPATCH_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Locate the configuration file.
///
/// Checks `DISPATCH_CONFIG_PATH`, then `config/` under the working
/// directory, then the working directory itself.
fn find_config_file() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var("DISPATCH_CONFIG_PATH") {
        let path = PathBuf::from(explicit);
        if path.exists() {
            return Some(path);
        }
    }

    let candidates = [
        "config/dispatch-config.yaml",
        "config/dispatch-config.yml",
        "dispatch-config.yaml",
        "dispatch-config.yml",
    ];

    for candidate in candidates {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Some(path);
        }
    }

    None
}

/// Load a YAML document and merge the environment section over the base
fn load_and_merge_config(path: &Path, environment: &str) -> Result<DispatchConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        DispatchError::configuration(
            "loader",
            format!("failed to read {}: {}", path.display(), e),
        )
    })?;

    let mut document: serde_yaml::Value = serde_yaml::from_str(&contents).map_err(|e| {
        DispatchError::configuration(
            "loader",
            format!("invalid YAML in {}: {}", path.display(), e),
        )
    })?;

    if let serde_yaml::Value::Mapping(ref mut root) = document {
        let overlay = root.remove(environment);

        // Drop the remaining environment sections so they never leak into the base
        for section in ENVIRONMENT_SECTIONS {
            root.remove(*section);
        }

        if let Some(overlay) = overlay {
            debug!(environment = environment, "Applying environment overrides");
            merge_yaml_values(&mut document, overlay);
        }
    }

    let mut config: DispatchConfig = serde_yaml::from_value(document).map_err(|e| {
        DispatchError::configuration(
            "loader",
            format!("configuration does not match expected schema: {e}"),
        )
    })?;

    config.environment = environment.to_string();
    Ok(config)
}

/// Recursively merge an overlay YAML value into a base value.
///
/// Mappings merge key-by-key; any other overlay value replaces the base.
fn merge_yaml_values(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base_map), serde_yaml::Value::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => merge_yaml_values(base_value, overlay_value),
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
