// src/config/validate.rs

use anyhow::{Result, anyhow};

use crate::config::model::Config;

/// Run basic semantic validation against a merged configuration.
///
/// This checks:
/// - there is at least one command to supervise
/// - the context directory exists
/// - every extra watch path exists
/// - the debounce window is non-zero
///
/// It deliberately does **not** compile ignore regexes here: a malformed
/// pattern is a recoverable condition handled (and logged once) when the
/// path filter is built, so the session still starts.
pub fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.commands.is_empty() {
        return Err(anyhow!(
            "no commands configured (use -c/--command or a config file)"
        ));
    }

    if !cfg.context.is_dir() {
        return Err(anyhow!(
            "context directory {:?} does not exist or is not a directory",
            cfg.context
        ));
    }

    for path in &cfg.paths {
        if !path.is_dir() {
            return Err(anyhow!(
                "watch path {:?} does not exist or is not a directory",
                path
            ));
        }
    }

    if cfg.debounce.is_zero() {
        return Err(anyhow!("debounce_ms must be >= 1 (got 0)"));
    }

    Ok(())
}
