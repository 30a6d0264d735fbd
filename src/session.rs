// src/session.rs

//! Top-level orchestration: monitor -> filter -> debounce -> supervisor.
//!
//! The session's event loop is the single serialization point for restarts:
//! `restart_all` runs inline in the loop, so two coalesced change bursts can
//! never overlap a restart, while the monitor/filter/debounce tasks keep
//! accepting events in the background the whole time.

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::proc::Supervisor;
use crate::watch::{Debouncer, MonitorEvent, MonitorHandle, PathFilter, spawn_monitor};

/// Events consumed by the session's orchestration loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEvent {
    /// A debounce window elapsed: relevant changes have settled.
    RestartRequested,
    /// External request to tear the session down.
    ShutdownRequested,
}

/// Cloneable handle that asks a running session to shut down.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: mpsc::Sender<SessionEvent>,
}

impl ShutdownHandle {
    pub async fn shutdown(&self) {
        // A closed channel means the session is already gone.
        let _ = self.tx.send(SessionEvent::ShutdownRequested).await;
    }
}

/// One watch-and-restart session.
///
/// Construction wires everything up and starts watching; [`WatchSession::run`]
/// then starts the managed commands and drives the loop until shutdown.
pub struct WatchSession {
    config: Config,
    supervisor: Supervisor,
    monitor: MonitorHandle,
    debouncer: Debouncer,
    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: mpsc::Receiver<SessionEvent>,
}

impl WatchSession {
    /// Wire up the pipeline. Failing to subscribe to any watch root is fatal.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: Config) -> Result<Self> {
        let filter = PathFilter::new(&config);

        let (events_tx, events_rx) = mpsc::channel::<SessionEvent>(64);

        // Debounce fires -> RestartRequested.
        let (fire_tx, mut fire_rx) = mpsc::channel::<()>(1);
        let debouncer = Debouncer::spawn(config.debounce, fire_tx);
        {
            let events_tx = events_tx.clone();
            tokio::spawn(async move {
                while fire_rx.recv().await.is_some() {
                    if events_tx.send(SessionEvent::RestartRequested).await.is_err() {
                        break;
                    }
                }
            });
        }

        // Monitor -> filter -> debounce trigger.
        let (monitor_tx, mut monitor_rx) = mpsc::unbounded_channel::<MonitorEvent>();
        let monitor = spawn_monitor(&config.watch_roots(), monitor_tx)?;
        {
            let debouncer = debouncer.clone();
            tokio::spawn(async move {
                while let Some(event) = monitor_rx.recv().await {
                    match event {
                        MonitorEvent::Changed { kind, path } => {
                            if filter.is_relevant(&path) {
                                debug!(?kind, path = %path.display(), "relevant change");
                                debouncer.trigger();
                            }
                        }
                        MonitorEvent::Error(err) => {
                            warn!(error = %err, "watch backend error");
                        }
                    }
                }
                debug!("monitor event stream ended");
            });
        }

        let supervisor = Supervisor::from_config(&config);

        Ok(Self {
            config,
            supervisor,
            monitor,
            debouncer,
            events_tx,
            events_rx,
        })
    }

    /// Handle that can stop this session from another task (Ctrl-C, tests).
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.events_tx.clone(),
        }
    }

    /// Start the managed commands once, then loop on coalesced change
    /// triggers until shutdown is requested.
    pub async fn run(mut self) -> Result<()> {
        info!(
            commands = ?self.config.commands,
            context = %self.config.context.display(),
            "watch session starting"
        );

        // Spawn failures are logged, not fatal: the next coalesced trigger
        // retries every handle.
        if let Err(err) = self.supervisor.start_all().await {
            warn!(error = %err, "some commands failed to start");
        }

        while let Some(event) = self.events_rx.recv().await {
            match event {
                SessionEvent::RestartRequested => {
                    info!("file changes settled, restarting commands");
                    if let Err(err) = self.supervisor.restart_all().await {
                        warn!(error = %err, "some commands failed to restart");
                    }
                }
                SessionEvent::ShutdownRequested => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        // Teardown, unconditionally in this order: release the OS watch,
        // cancel any pending debounce window unfired, stop every process.
        drop(self.monitor);
        drop(self.debouncer);
        if let Err(err) = self.supervisor.stop_all().await {
            warn!(error = %err, "errors while stopping commands");
        }

        info!("watch session stopped");
        Ok(())
    }
}
