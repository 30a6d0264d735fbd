// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod proc;
pub mod session;
pub mod watch;

use anyhow::Result;

use crate::cli::CliArgs;
use crate::config::Config;
use crate::session::WatchSession;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config resolution (file + CLI flags)
/// - the watch session (monitor, filter, debounce, supervisor)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config = Config::from_args(&args)?;
    let session = WatchSession::new(config)?;

    // Ctrl-C -> graceful shutdown.
    {
        let shutdown = session.shutdown_handle();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            shutdown.shutdown().await;
        });
    }

    session.run().await
}
