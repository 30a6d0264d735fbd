// src/watch/debounce.rs

//! A standalone debounce primitive.
//!
//! Classic trailing-edge debounce: the first trigger after a quiet period
//! arms a timer; every further trigger before it elapses re-arms it. Only
//! when the window passes with no new trigger does exactly one fire get
//! emitted. A continuous stream of triggers therefore defers the fire
//! indefinitely until the input quiets down.
//!
//! The primitive knows nothing about restarts; it just forwards units on a
//! channel, which keeps the timing behaviour unit-testable on a paused clock.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time;
use tracing::debug;

/// Handle to a running debounce task.
///
/// Cloneable so multiple producers can trigger it. When every handle is
/// dropped, the task exits; a pending window is cancelled without firing.
#[derive(Debug, Clone)]
pub struct Debouncer {
    trigger_tx: mpsc::UnboundedSender<()>,
}

impl Debouncer {
    /// Spawn a debounce task with the given quiet window.
    ///
    /// Each elapsed window sends one unit on `fire_tx`. If the consumer is
    /// slow, at most one fire is in flight at a time; triggers arriving
    /// meanwhile simply start the next window as usual.
    pub fn spawn(window: Duration, fire_tx: mpsc::Sender<()>) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        tokio::spawn(debounce_loop(window, trigger_rx, fire_tx));
        Self { trigger_tx }
    }

    /// Record one triggering event. Cheap and non-blocking.
    pub fn trigger(&self) {
        // Send only fails if the task is gone, which means we are shutting down.
        let _ = self.trigger_tx.send(());
    }
}

async fn debounce_loop(
    window: Duration,
    mut trigger_rx: mpsc::UnboundedReceiver<()>,
    fire_tx: mpsc::Sender<()>,
) {
    'idle: loop {
        // Quiet: wait for the first trigger.
        if trigger_rx.recv().await.is_none() {
            debug!("debouncer cancelled while idle");
            return;
        }

        // Armed: each further trigger re-creates the sleep, resetting the window.
        loop {
            let window_sleep = time::sleep(window);
            tokio::pin!(window_sleep);

            tokio::select! {
                biased;
                maybe = trigger_rx.recv() => match maybe {
                    Some(()) => continue,
                    // All handles dropped: cancel the pending window unfired.
                    None => {
                        debug!("debouncer cancelled with a pending window");
                        return;
                    }
                },
                () = &mut window_sleep => {
                    debug!("debounce window elapsed, firing");
                    if fire_tx.send(()).await.is_err() {
                        return;
                    }
                    continue 'idle;
                }
            }
        }
    }
}
