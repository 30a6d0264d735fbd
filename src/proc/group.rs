// src/proc/group.rs

//! Process-group termination primitive.
//!
//! Managed commands are spawned as the leader of their own process group, so
//! one signal reaches every descendant a command forked (shells forking
//! further children included). This module hides the platform difference:
//! Unix signals the negated group id via `killpg`; Windows has no process
//! groups in that sense and falls back to a `taskkill` tree kill.

use anyhow::Result;

/// How hard to hit the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSignal {
    /// Polite request to exit (SIGTERM).
    Terminate,
    /// Non-ignorable kill (SIGKILL).
    Kill,
}

/// Send `signal` to the entire process group led by `pid`.
///
/// A group that no longer exists counts as success: the processes are gone,
/// which is the outcome we wanted.
#[cfg(unix)]
pub async fn terminate_group(pid: u32, signal: GroupSignal) -> Result<()> {
    use anyhow::anyhow;
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let sig = match signal {
        GroupSignal::Terminate => Signal::SIGTERM,
        GroupSignal::Kill => Signal::SIGKILL,
    };

    let pgid = Pid::from_raw(pid as i32);
    match killpg(pgid, sig) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => Ok(()),
        Err(err) => Err(anyhow!("killpg({pid}, {sig:?}) failed: {err}")),
    }
}

/// Windows fallback: `taskkill /t` kills the whole tree. There is no graceful
/// variant, so both signal levels behave like a kill.
#[cfg(windows)]
pub async fn terminate_group(pid: u32, _signal: GroupSignal) -> Result<()> {
    use anyhow::Context;
    use std::process::Stdio;

    let status = tokio::process::Command::new("taskkill")
        .args(["/pid", &pid.to_string(), "/f", "/t"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .context("spawning taskkill")?;

    // taskkill reports an error for an already-gone pid; that is success here.
    let _ = status;
    Ok(())
}
