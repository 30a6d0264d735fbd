// src/watch/monitor.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::info;

/// One delivery from the filesystem monitor.
///
/// `Changed` carries a raw mutation event (create/write/remove/rename); the
/// monitor does no filtering or interpretation beyond dropping pure access
/// notifications. `Error` carries a watch-backend runtime error, which the
/// consumer is expected to log and survive.
#[derive(Debug)]
pub enum MonitorEvent {
    Changed { kind: EventKind, path: PathBuf },
    Error(notify::Error),
}

/// Handle for the filesystem monitor.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle unsubscribes every root and
/// releases the OS watch resource.
pub struct MonitorHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorHandle").finish()
    }
}

/// Subscribe recursively to every given root and forward raw change events
/// over `tx`.
///
/// Failing to subscribe to any root is a fatal setup error and aborts
/// construction. Runtime backend errors after startup are forwarded as
/// [`MonitorEvent::Error`] instead, so the session can log them and keep
/// running. Directories created later under a root are picked up by the
/// backend's recursive mode.
pub fn spawn_monitor(
    roots: &[PathBuf],
    tx: mpsc::UnboundedSender<MonitorEvent>,
) -> Result<MonitorHandle> {
    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                // Access events are not mutations; reacting to them would
                // restart on every file read.
                if matches!(event.kind, EventKind::Access(_)) {
                    return;
                }
                for path in event.paths {
                    let _ = tx.send(MonitorEvent::Changed {
                        kind: event.kind,
                        path,
                    });
                }
            }
            Err(err) => {
                let _ = tx.send(MonitorEvent::Error(err));
            }
        },
        Config::default(),
    )?;

    for root in roots {
        let root = root.canonicalize().unwrap_or_else(|_| root.clone());
        watcher
            .watch(&root, RecursiveMode::Recursive)
            .with_context(|| format!("subscribing to watch root {:?}", root))?;
        info!("watching {:?}", root);
    }

    Ok(MonitorHandle { _inner: watcher })
}
