// src/proc/supervisor.rs

use anyhow::{Result, anyhow};
use tracing::{error, info};

use crate::config::Config;
use crate::proc::handle::ProcessHandle;

/// Owns the ordered list of managed processes for one session.
///
/// The list is built once from the config and never changes afterwards; only
/// each handle's internal state does. Every operation walks the handles
/// sequentially in configured order, so commands that rely on startup
/// ordering (a backend before its proxy, say) get a stable sequence.
pub struct Supervisor {
    handles: Vec<ProcessHandle>,
}

impl Supervisor {
    pub fn new(handles: Vec<ProcessHandle>) -> Self {
        Self { handles }
    }

    /// One handle per configured command, all sharing the context directory
    /// and environment overrides.
    pub fn from_config(config: &Config) -> Self {
        let handles = config
            .commands
            .iter()
            .map(|command| {
                ProcessHandle::new(command.clone(), config.context.clone(), config.env.clone())
            })
            .collect();
        Self::new(handles)
    }

    pub fn handles(&self) -> &[ProcessHandle] {
        &self.handles
    }

    pub fn handles_mut(&mut self) -> &mut [ProcessHandle] {
        &mut self.handles
    }

    /// Start every handle in configured order.
    ///
    /// Policy: a failing spawn does not block the remaining commands; all
    /// failures are collected and returned as one aggregate error. A handle
    /// that failed stays `Idle` and will be retried on the next restart.
    pub async fn start_all(&mut self) -> Result<()> {
        let mut failures = Vec::new();
        for handle in &mut self.handles {
            if let Err(err) = handle.start().await {
                error!(command = %handle.command(), error = %err, "failed to start command");
                failures.push((handle.command().to_string(), err));
            }
        }
        aggregate("start", failures)
    }

    /// Restart every handle sequentially, in configured order.
    ///
    /// A handle whose stop could not be confirmed keeps its old process and
    /// reports an error, but the remaining handles are still restarted so one
    /// stuck command does not wedge the whole set.
    pub async fn restart_all(&mut self) -> Result<()> {
        info!("restarting managed commands");
        let mut failures = Vec::new();
        for handle in &mut self.handles {
            if let Err(err) = handle.restart().await {
                error!(command = %handle.command(), error = %err, "failed to restart command");
                failures.push((handle.command().to_string(), err));
            }
        }
        aggregate("restart", failures)
    }

    /// Stop every handle; used at session teardown.
    pub async fn stop_all(&mut self) -> Result<()> {
        let mut failures = Vec::new();
        for handle in &mut self.handles {
            if let Err(err) = handle.stop().await {
                error!(command = %handle.command(), error = %err, "failed to stop command");
                failures.push((handle.command().to_string(), err));
            }
        }
        aggregate("stop", failures)
    }
}

fn aggregate(op: &str, failures: Vec<(String, anyhow::Error)>) -> Result<()> {
    if failures.is_empty() {
        return Ok(());
    }
    let summary = failures
        .iter()
        .map(|(command, err)| format!("'{command}': {err:#}"))
        .collect::<Vec<_>>()
        .join("; ");
    Err(anyhow!("failed to {op} {} command(s): {summary}", failures.len()))
}
