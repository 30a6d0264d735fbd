// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `watchrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchrun",
    version,
    about = "Watch a directory tree and restart commands on file changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Command to run and restart on change (repeatable).
    ///
    /// Each occurrence adds one shell command line; commands are started and
    /// restarted in the order given. Required unless a config file supplies
    /// commands.
    #[arg(short = 'c', long = "command", value_name = "CMD")]
    pub commands: Vec<String>,

    /// Working directory for the commands; also the primary watch root.
    ///
    /// Default: the current working directory.
    #[arg(long, value_name = "DIR")]
    pub context: Option<String>,

    /// Additional directory to watch recursively (repeatable).
    #[arg(long = "path", value_name = "DIR")]
    pub paths: Vec<String>,

    /// Regex matched against changed file paths; matches are ignored (repeatable).
    #[arg(long = "ignore", value_name = "REGEX")]
    pub ignores: Vec<String>,

    /// Only react to files with this extension, e.g. `.go` (repeatable).
    ///
    /// If no extension is given, every file is considered relevant.
    #[arg(long = "ext", value_name = "EXT")]
    pub exts: Vec<String>,

    /// Extra environment variable for the commands, as KEY=VALUE (repeatable).
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Path to an optional config file (TOML).
    ///
    /// If omitted, `Watchrun.toml` in the current directory is used when it
    /// exists; otherwise the CLI flags alone form the config.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Quiet window in milliseconds before a change triggers a restart.
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
