//! Instrumented signal bus used by the demo host
//!
//! Emissions are queued on a crossbeam channel and picked up by a pool of
//! dispatch threads. Dispatching a signal enters a recorder frame, does a
//! little work, then emits every signal connected to it, so the recorded tree
//! mirrors the connection graph:
//!
//! ```text
//! Application.mainWindowChanged
//! └── Scene.sceneChanged
//!     ├── Camera.update
//!     └── Selection.changed
//!         └── Tool.updateHandles
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, warn};

use crate::profiling::SampleRecorder;

/// Pending emissions before `emit` starts dropping
const QUEUE_CAPACITY: usize = 1024;

/// Signal → signals emitted by its connected slots
pub const SIGNAL_GRAPH: &[(&str, &[&str])] = &[
    ("Application.mainWindowChanged", &["Scene.sceneChanged"]),
    ("Scene.sceneChanged", &["Camera.update", "Selection.changed"]),
    ("Selection.changed", &["Tool.updateHandles"]),
    ("Job.finished", &["Scene.sceneChanged"]),
    ("Preferences.preferenceChanged", &[]),
    ("Camera.update", &[]),
    ("Tool.updateHandles", &[]),
];

/// Signals the ticker emits from outside any dispatch
pub const ROOT_SIGNALS: &[&str] = &[
    "Application.mainWindowChanged",
    "Job.finished",
    "Preferences.preferenceChanged",
];

fn connections(signal: &str) -> &'static [&'static str] {
    SIGNAL_GRAPH
        .iter()
        .find(|(name, _)| *name == signal)
        .map(|(_, slots)| *slots)
        .unwrap_or_default()
}

/// Dispatch `signal` and everything it triggers on the current thread
fn dispatch(recorder: &SampleRecorder, signal: &str, work: Duration) {
    let _frame = recorder.frame(signal);
    if !work.is_zero() {
        thread::sleep(work);
    }
    for next in connections(signal) {
        dispatch(recorder, next, work);
    }
}

pub struct SignalBus {
    tx: Option<Sender<&'static str>>,
    workers: Vec<JoinHandle<()>>,
    ticker: Option<(Arc<AtomicBool>, JoinHandle<()>)>,
}

impl SignalBus {
    /// Spawn `dispatchers` threads that dispatch queued signals, spending `work` per slot
    pub fn new(recorder: Arc<SampleRecorder>, dispatchers: usize, work: Duration) -> Self {
        let (tx, rx) = bounded(QUEUE_CAPACITY);
        let workers = (0..dispatchers.max(1))
            .map(|i| {
                let rx: Receiver<&'static str> = rx.clone();
                let recorder = Arc::clone(&recorder);
                thread::Builder::new()
                    .name(format!("bfg-dispatch-{i}"))
                    .spawn(move || {
                        for signal in rx {
                            dispatch(&recorder, signal, work);
                        }
                    })
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!("Failed to spawn dispatch thread: {e}");
                    None
                }
            })
            .collect();

        Self {
            tx: Some(tx),
            workers,
            ticker: None,
        }
    }

    /// Queue an emission. Returns false if the queue is full or closed.
    pub fn emit(&self, signal: &'static str) -> bool {
        self.tx
            .as_ref()
            .is_some_and(|tx| tx.try_send(signal).is_ok())
    }

    /// Emit [`ROOT_SIGNALS`] round-robin every `interval` until shutdown
    pub fn start_ticker(&mut self, interval: Duration) {
        let Some(tx) = self.tx.clone() else {
            return;
        };
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let spawned = thread::Builder::new()
            .name("bfg-ticker".to_string())
            .spawn(move || {
                for signal in ROOT_SIGNALS.iter().cycle() {
                    if !flag.load(Ordering::Acquire) {
                        break;
                    }
                    if tx.try_send(*signal).is_err() {
                        debug!("Signal queue full, skipping {signal}");
                    }
                    thread::sleep(interval);
                }
            });
        match spawned {
            Ok(handle) => self.ticker = Some((running, handle)),
            Err(e) => warn!("Failed to spawn ticker thread: {e}"),
        }
    }

    /// Stop the ticker, let dispatchers drain the queue, and join everything
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some((running, handle)) = self.ticker.take() {
            running.store(false, Ordering::Release);
            if handle.join().is_err() {
                warn!("Ticker thread panicked");
            }
        }
        // Closing the channel ends each dispatcher's loop once the queue is empty
        self.tx.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("Dispatch thread panicked");
            }
        }
    }
}

impl Drop for SignalBus {
    fn drop(&mut self) {
        self.stop();
    }
}
