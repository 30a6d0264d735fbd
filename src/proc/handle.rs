// src/proc/handle.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::process::{Child, Command};
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::proc::group::{self, GroupSignal};

/// Wait after signaling termination before the slot is considered reusable,
/// so a restart never races the OS still reclaiming the old process.
const STOP_GRACE: Duration = Duration::from_millis(100);

/// Lifecycle state of a handle.
///
/// `Idle` is both the initial state and the state reached after a completed
/// stop; `Terminating` only persists across calls if a stop could not confirm
/// the process dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Idle,
    Running,
    Terminating,
}

/// Owns one managed command's lifecycle.
///
/// At most one live OS process is associated with a handle at any time; a new
/// process is only spawned after the previous one has been confirmed dead.
/// Callers (the supervisor) guarantee that at most one start/stop/restart is
/// in flight per handle.
pub struct ProcessHandle {
    command: String,
    context: PathBuf,
    env: BTreeMap<String, String>,
    state: HandleState,
    child: Option<Child>,
}

impl ProcessHandle {
    pub fn new(
        command: impl Into<String>,
        context: impl Into<PathBuf>,
        env: BTreeMap<String, String>,
    ) -> Self {
        Self {
            command: command.into(),
            context: context.into(),
            env,
            state: HandleState::Idle,
            child: None,
        }
    }

    /// The shell command line this handle manages.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Pid of the live process, if any.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(|c| c.id())
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    /// True while the spawned process has not exited.
    ///
    /// Also detects a process that crashed on its own; the exit status is
    /// cached by tokio, so this does not interfere with a later `stop`.
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Spawn the command.
    ///
    /// The process runs under `sh -c` (`cmd /C` on Windows) in the configured
    /// context directory, inheriting our environment with the configured
    /// overrides merged on top, as the leader of its own process group. Its
    /// stdout/stderr are relayed to our own streams. A spawn failure is
    /// returned, not retried; the handle stays `Idle`.
    pub async fn start(&mut self) -> Result<()> {
        if self.child.is_some() {
            if self.state == HandleState::Terminating {
                // A previous stop could not confirm the process dead; spawning
                // over it would orphan the old group.
                return Err(anyhow!(
                    "process for '{}' is still terminating; refusing to start a duplicate",
                    self.command
                ));
            }
            debug!(command = %self.command, "start requested but process already running");
            return Ok(());
        }

        let mut cmd = shell_command(&self.command);
        cmd.current_dir(&self.context)
            .envs(&self.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning '{}'", self.command))?;

        if let Some(mut stdout) = child.stdout.take() {
            tokio::spawn(async move {
                let _ = tokio::io::copy(&mut stdout, &mut tokio::io::stdout()).await;
            });
        }
        if let Some(mut stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let _ = tokio::io::copy(&mut stderr, &mut tokio::io::stderr()).await;
            });
        }

        info!(command = %self.command, pid = child.id(), "process started");
        self.child = Some(child);
        self.state = HandleState::Running;
        Ok(())
    }

    /// Terminate the process group and wait out the grace interval.
    ///
    /// Idempotent: with nothing running this is a no-op. A process that
    /// already exited on its own is reaped and treated as stopped. If after
    /// graceful and forceful signaling the process still cannot be confirmed
    /// dead, the handle keeps it, stays `Terminating`, and returns an error
    /// rather than allowing a duplicate to be started over it.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            debug!(command = %self.command, "stop requested but nothing is running");
            return Ok(());
        };
        self.state = HandleState::Terminating;

        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(command = %self.command, %status, "process had already exited");
                self.state = HandleState::Idle;
                return Ok(());
            }
            Ok(None) => {}
            Err(err) => {
                // Keep the child so a later stop can retry instead of
                // forgetting a possibly-live process.
                self.child = Some(child);
                return Err(err)
                    .with_context(|| format!("checking process state for '{}'", self.command));
            }
        }

        if let Some(pid) = child.id() {
            if let Err(err) = group::terminate_group(pid, GroupSignal::Terminate).await {
                warn!(command = %self.command, pid, error = %err, "failed to signal process group");
            }
        }

        time::sleep(STOP_GRACE).await;

        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(command = %self.command, %status, "process exited within grace interval");
            }
            Err(err) => {
                self.child = Some(child);
                return Err(err)
                    .with_context(|| format!("checking process state for '{}'", self.command));
            }
            Ok(None) => {
                // Still alive after the grace interval: escalate.
                if let Some(pid) = child.id() {
                    if let Err(err) = group::terminate_group(pid, GroupSignal::Kill).await {
                        error!(
                            command = %self.command,
                            pid,
                            error = %err,
                            "process group could not be killed; refusing to reuse the slot"
                        );
                        self.child = Some(child);
                        return Err(anyhow!(
                            "process for '{}' (pid {pid}) is stuck and could not be killed",
                            self.command
                        ));
                    }
                }
                if let Err(err) = child.wait().await {
                    self.child = Some(child);
                    return Err(err)
                        .with_context(|| format!("reaping process for '{}'", self.command));
                }
            }
        }

        self.state = HandleState::Idle;
        info!(command = %self.command, "process stopped");
        Ok(())
    }

    /// Stop, then start again.
    ///
    /// The stop (including its grace interval) fully completes before the new
    /// process is spawned, so two instances of the same command are never
    /// alive at once. An unconfirmed stop aborts the restart for this handle.
    pub async fn restart(&mut self) -> Result<()> {
        self.stop().await?;
        self.start().await
    }
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("command", &self.command)
            .field("state", &self.state)
            .field("pid", &self.pid())
            .finish()
    }
}

fn shell_command(command_line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command_line);
        c
    }
}
