// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde::Deserialize;

use crate::cli::CliArgs;
use crate::config::loader;
use crate::config::validate::validate_config;

/// Default quiet window before a coalesced change triggers a restart.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Resolved, immutable configuration for one watch session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the commands; also the primary watch root.
    pub context: PathBuf,

    /// Additional directories watched recursively besides `context`.
    pub paths: Vec<PathBuf>,

    /// Regex patterns matched against full changed-file paths; a match means
    /// the change is ignored.
    pub ignores: Vec<String>,

    /// Extension allow-list; empty means every extension is relevant.
    /// Entries may be given with or without a leading dot.
    pub exts: Vec<String>,

    /// Shell command lines, started and restarted in this order.
    pub commands: Vec<String>,

    /// Environment overrides merged over the inherited environment.
    pub env: BTreeMap<String, String>,

    /// Quiet window for change coalescing.
    pub debounce: Duration,
}

/// On-disk configuration as read from a TOML file.
///
/// Example:
///
/// ```toml
/// context = "./app"
/// paths = ["../shared"]
/// ignores = ['\.git/', 'node_modules']
/// exts = [".go"]
/// commands = ["go run ."]
/// debounce_ms = 300
///
/// [env]
/// PORT = "8080"
/// ```
///
/// All fields are optional; CLI flags are merged on top.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFileModel {
    #[serde(default)]
    pub context: Option<String>,

    #[serde(default)]
    pub paths: Vec<String>,

    #[serde(default)]
    pub ignores: Vec<String>,

    #[serde(default)]
    pub exts: Vec<String>,

    #[serde(default)]
    pub commands: Vec<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub debounce_ms: Option<u64>,
}

impl Config {
    /// Build and validate a config from parsed CLI args plus the optional
    /// config file.
    ///
    /// Merge rules: list-valued flags append to the file's lists; scalar flags
    /// (`--context`, `--debounce-ms`) override the file's values.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => loader::load_from_path(path)?,
            None => {
                let default = loader::default_config_path();
                if default.is_file() {
                    loader::load_from_path(&default)?
                } else {
                    ConfigFileModel::default()
                }
            }
        };

        let context = args
            .context
            .clone()
            .or(file.context)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut paths: Vec<PathBuf> = file.paths.iter().map(PathBuf::from).collect();
        paths.extend(args.paths.iter().map(PathBuf::from));

        let mut ignores = file.ignores;
        ignores.extend(args.ignores.iter().cloned());

        let mut exts = file.exts;
        exts.extend(args.exts.iter().cloned());

        let mut commands = file.commands;
        commands.extend(args.commands.iter().cloned());

        let mut env = file.env;
        for pair in &args.env {
            let (key, value) = parse_env_pair(pair)?;
            env.insert(key, value);
        }

        let debounce_ms = args
            .debounce_ms
            .or(file.debounce_ms)
            .unwrap_or(DEFAULT_DEBOUNCE_MS);

        let config = Self {
            context,
            paths,
            ignores,
            exts,
            commands,
            env,
            debounce: Duration::from_millis(debounce_ms),
        };

        validate_config(&config)?;
        Ok(config)
    }

    /// All directories the session watches: the context plus extra paths.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        let mut roots = vec![self.context.clone()];
        roots.extend(self.paths.iter().cloned());
        roots
    }
}

fn parse_env_pair(pair: &str) -> Result<(String, String)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(anyhow!("invalid --env value '{pair}' (expected KEY=VALUE)")),
    }
}
