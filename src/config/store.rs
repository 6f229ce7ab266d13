use std::fs;
use std::path::Path;
use tracing::debug;

use super::GadgetConfig;
use crate::error::{AppError, Result};

/// Load configuration from a TOML file
///
/// Missing keys fall back to their defaults.
pub fn load(path: &Path) -> Result<GadgetConfig> {
    let raw = fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let config = parse(&raw)
        .map_err(|e| AppError::Config(format!("Invalid config {}: {}", path.display(), e)))?;
    debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Parse configuration from TOML text
pub fn parse(raw: &str) -> std::result::Result<GadgetConfig, toml::de::Error> {
    toml::from_str(raw)
}

/// Reject values no operation can work with
pub fn validate(config: &GadgetConfig) -> Result<()> {
    if config.driver_module.trim().is_empty() {
        return Err(AppError::Config("driver_module must not be empty".to_string()));
    }
    if config.default_size_gb == 0 {
        return Err(AppError::Config(
            "default_size_gb must be greater than 0".to_string(),
        ));
    }
    if config.scratch_mount_path.as_os_str().is_empty() {
        return Err(AppError::Config(
            "scratch_mount_path must not be empty".to_string(),
        ));
    }
    if let Some(bad) = config
        .seed_directories
        .iter()
        .find(|d| d.is_empty() || d.contains('/') || d.as_str() == "..")
    {
        return Err(AppError::Config(format!(
            "seed directory '{}' must be a single path component",
            bad
        )));
    }
    Ok(())
}
