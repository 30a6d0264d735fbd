//! End-to-end session behaviour against a real filesystem and real processes.
//!
//! Each test runs a session whose single command appends a line to a log file
//! *outside* the watched tree, so counting log lines counts command starts:
//! one line for the initial start, one more per coalesced restart.

#![cfg(unix)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use watchrun::config::Config;
use watchrun::session::WatchSession;

fn config(watch_dir: &Path, log: &Path) -> Config {
    Config {
        context: watch_dir.to_path_buf(),
        paths: vec![],
        ignores: vec![],
        exts: vec![],
        commands: vec![format!("echo run >> '{}'", log.display())],
        env: BTreeMap::new(),
        debounce: Duration::from_millis(150),
    }
}

fn line_count(log: &Path) -> usize {
    std::fs::read_to_string(log)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

async fn wait_until<F: FnMut() -> bool>(mut cond: F, timeout: Duration) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

async fn wait_for_lines(log: &Path, want: usize, timeout: Duration) -> bool {
    wait_until(|| line_count(log) >= want, timeout).await
}

fn marker_count(log: &Path, marker: &str) -> usize {
    std::fs::read_to_string(log)
        .map(|s| s.lines().filter(|line| *line == marker).count())
        .unwrap_or(0)
}

struct Harness {
    _watch: tempfile::TempDir,
    _out: tempfile::TempDir,
    watch_dir: PathBuf,
    log: PathBuf,
}

fn harness() -> Harness {
    let watch = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let watch_dir = watch.path().to_path_buf();
    let log = out.path().join("runs.log");
    Harness {
        _watch: watch,
        _out: out,
        watch_dir,
        log,
    }
}

/// Let the watch backend settle before mutating the tree.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn burst_of_changes_causes_exactly_one_restart() {
    let h = harness();
    let session = WatchSession::new(config(&h.watch_dir, &h.log)).unwrap();
    let shutdown = session.shutdown_handle();
    let running = tokio::spawn(session.run());

    assert!(
        wait_for_lines(&h.log, 1, Duration::from_secs(5)).await,
        "command should run once at session start"
    );
    settle().await;

    // A burst of writes inside one debounce window coalesces to one restart.
    for name in ["a.txt", "b.txt", "c.txt"] {
        std::fs::write(h.watch_dir.join(name), b"change").unwrap();
    }

    assert!(
        wait_for_lines(&h.log, 2, Duration::from_secs(5)).await,
        "burst should trigger a restart"
    );
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(line_count(&h.log), 2, "burst must coalesce to one restart");

    shutdown.shutdown().await;
    running.await.unwrap().unwrap();
}

#[tokio::test]
async fn quiet_then_change_restarts_again() {
    let h = harness();
    let session = WatchSession::new(config(&h.watch_dir, &h.log)).unwrap();
    let shutdown = session.shutdown_handle();
    let running = tokio::spawn(session.run());

    assert!(wait_for_lines(&h.log, 1, Duration::from_secs(5)).await);
    settle().await;

    std::fs::write(h.watch_dir.join("first.txt"), b"x").unwrap();
    assert!(wait_for_lines(&h.log, 2, Duration::from_secs(5)).await);

    // Well after the first restart, a fresh change starts a fresh window.
    tokio::time::sleep(Duration::from_millis(600)).await;
    std::fs::write(h.watch_dir.join("second.txt"), b"y").unwrap();
    assert!(wait_for_lines(&h.log, 3, Duration::from_secs(5)).await);

    shutdown.shutdown().await;
    running.await.unwrap().unwrap();
}

#[tokio::test]
async fn writes_under_git_never_restart() {
    let h = harness();
    std::fs::create_dir(h.watch_dir.join(".git")).unwrap();

    // No explicit ignores: the context's .git is ignored implicitly.
    let session = WatchSession::new(config(&h.watch_dir, &h.log)).unwrap();
    let shutdown = session.shutdown_handle();
    let running = tokio::spawn(session.run());

    assert!(wait_for_lines(&h.log, 1, Duration::from_secs(5)).await);
    settle().await;

    std::fs::write(h.watch_dir.join(".git/index"), b"idx").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(line_count(&h.log), 1, ".git writes must not restart");

    shutdown.shutdown().await;
    running.await.unwrap().unwrap();
}

#[tokio::test]
async fn explicit_ignore_pattern_suppresses_restarts() {
    let h = harness();
    std::fs::create_dir(h.watch_dir.join("skipme")).unwrap();

    let mut cfg = config(&h.watch_dir, &h.log);
    cfg.ignores = vec![r"skipme/".to_string()];
    let session = WatchSession::new(cfg).unwrap();
    let shutdown = session.shutdown_handle();
    let running = tokio::spawn(session.run());

    assert!(wait_for_lines(&h.log, 1, Duration::from_secs(5)).await);
    settle().await;

    std::fs::write(h.watch_dir.join("skipme/data.txt"), b"x").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(line_count(&h.log), 1, "ignored path must not restart");

    // A non-ignored change still restarts.
    std::fs::write(h.watch_dir.join("kept.txt"), b"y").unwrap();
    assert!(wait_for_lines(&h.log, 2, Duration::from_secs(5)).await);

    shutdown.shutdown().await;
    running.await.unwrap().unwrap();
}

#[tokio::test]
async fn extension_allow_list_gates_restarts() {
    let h = harness();

    let mut cfg = config(&h.watch_dir, &h.log);
    cfg.exts = vec![".go".to_string()];
    let session = WatchSession::new(cfg).unwrap();
    let shutdown = session.shutdown_handle();
    let running = tokio::spawn(session.run());

    assert!(wait_for_lines(&h.log, 1, Duration::from_secs(5)).await);
    settle().await;

    std::fs::write(h.watch_dir.join("README.md"), b"docs").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(line_count(&h.log), 1, "non-allow-listed extension must not restart");

    std::fs::write(h.watch_dir.join("main.go"), b"package main").unwrap();
    assert!(wait_for_lines(&h.log, 2, Duration::from_secs(5)).await);
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(line_count(&h.log), 2, "a single .go write restarts exactly once");

    shutdown.shutdown().await;
    running.await.unwrap().unwrap();
}

#[tokio::test]
async fn long_running_command_gets_a_new_pid_on_change() {
    let h = harness();

    // The command records its own pid, then stays alive; restarts append a
    // new pid line.
    let mut cfg = config(&h.watch_dir, &h.log);
    cfg.commands = vec![format!("echo $$ >> '{}'; sleep 100", h.log.display())];
    let session = WatchSession::new(cfg).unwrap();
    let shutdown = session.shutdown_handle();
    let running = tokio::spawn(session.run());

    assert!(wait_for_lines(&h.log, 1, Duration::from_secs(5)).await);
    settle().await;

    std::fs::write(h.watch_dir.join("touched.txt"), b"x").unwrap();
    assert!(
        wait_for_lines(&h.log, 2, Duration::from_secs(5)).await,
        "change should restart the long-running command"
    );

    let contents = std::fs::read_to_string(&h.log).unwrap();
    let pids: Vec<&str> = contents.lines().collect();
    assert_eq!(pids.len(), 2);
    assert_ne!(pids[0], pids[1], "restart must produce a new pid");

    let old_pid: u32 = pids[0].trim().parse().unwrap();
    assert!(
        !process_alive(old_pid),
        "old process must be dead after the restart"
    );

    shutdown.shutdown().await;
    running.await.unwrap().unwrap();

    // Teardown stopped the replacement too.
    let new_pid: u32 = pids[1].trim().parse().unwrap();
    assert!(!process_alive(new_pid));
}

/// A command that ignores SIGTERM (so every stop runs the full grace interval
/// and SIGKILL escalation), records its pid, and reports whether the previous
/// instance was still alive when it came up.
fn stubborn_command(tag: &str, pid_file: &Path, log: &Path) -> String {
    format!(
        "prev=$(cat '{pf}' 2>/dev/null); \
         if [ -n \"$prev\" ] && kill -0 \"$prev\" 2>/dev/null; then echo overlap-{tag} >> '{lg}'; fi; \
         echo $$ > '{pf}'; echo start-{tag} >> '{lg}'; \
         trap '' TERM; while :; do sleep 1; done",
        pf = pid_file.display(),
        lg = log.display(),
        tag = tag,
    )
}

#[tokio::test]
async fn back_to_back_triggers_never_overlap_restarts() {
    let h = harness();
    let out_dir = h.log.parent().unwrap().to_path_buf();

    let mut cfg = config(&h.watch_dir, &h.log);
    cfg.debounce = Duration::from_millis(80);
    cfg.commands = vec![
        stubborn_command("a", &out_dir.join("a.pid"), &h.log),
        stubborn_command("b", &out_dir.join("b.pid"), &h.log),
    ];
    let session = WatchSession::new(cfg).unwrap();
    let shutdown = session.shutdown_handle();
    let running = tokio::spawn(session.run());

    assert!(
        wait_until(
            || marker_count(&h.log, "start-a") >= 1 && marker_count(&h.log, "start-b") >= 1,
            Duration::from_secs(5),
        )
        .await,
        "both commands should run at session start"
    );
    settle().await;

    // Two bursts spaced wider than the debounce window, but close enough that
    // the second coalesced trigger arrives while the first restart is still
    // working through grace + SIGKILL for both SIGTERM-ignoring commands.
    std::fs::write(h.watch_dir.join("one.txt"), b"x").unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    std::fs::write(h.watch_dir.join("two.txt"), b"y").unwrap();

    assert!(
        wait_until(
            || marker_count(&h.log, "start-a") >= 3 && marker_count(&h.log, "start-b") >= 3,
            Duration::from_secs(10),
        )
        .await,
        "each burst should restart every command once"
    );
    tokio::time::sleep(Duration::from_millis(800)).await;

    let contents = std::fs::read_to_string(&h.log).unwrap();
    assert!(
        !contents.contains("overlap"),
        "a command started while its previous instance was still alive:\n{contents}"
    );
    assert_eq!(marker_count(&h.log, "start-a"), 3);
    assert_eq!(marker_count(&h.log, "start-b"), 3);

    shutdown.shutdown().await;
    running.await.unwrap().unwrap();
}

fn process_alive(pid: u32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    let state = stat
        .rsplit_once(')')
        .and_then(|(_, rest)| rest.trim_start().chars().next());
    !matches!(state, Some('Z') | Some('X') | None)
}
