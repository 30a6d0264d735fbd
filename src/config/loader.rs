// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::model::ConfigFileModel;

/// Load a configuration file from a given path.
///
/// This only performs TOML deserialization; semantic validation happens in
/// [`crate::config::validate`] after CLI flags have been merged in.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFileModel> {
    let path = path.as_ref();
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading config file at {:?}", path))?;

    let config: ConfigFileModel = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML config from {:?}", path))?;

    Ok(config)
}

/// Helper to resolve the default config path.
///
/// Currently this just returns `Watchrun.toml` in the current working
/// directory; it exists so project-local discovery or an env var override
/// can be added in one place later.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Watchrun.toml")
}
