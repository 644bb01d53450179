//! # Sample Recorder
//!
//! Records signal emissions into a call tree while recording is enabled.
//!
//! ## Instrumentation contract
//!
//! The host's dispatch mechanism calls [`SampleRecorder::on_frame_enter`] when
//! a signal starts emitting and [`SampleRecorder::on_frame_exit`] when it
//! returns. Each dispatching thread gets its own call stack, so nested
//! emissions on one thread build parent/child paths while emissions on other
//! threads land under the root independently.
//!
//! ## Locking
//!
//! - `recording` is an atomic checked before anything else, so hooks cost one
//!   load while idle.
//! - One mutex guards the tree and all per-thread stacks. Every hook holds it
//!   for a single lookup/update; [`SampleRecorder::snapshot`] holds it only
//!   while copying the tree.
//!
//! Hooks never fail. An exit that does not match the thread's current frame
//! is dropped and logged at debug level. Exits arriving while stopped are
//! dropped too; `start()` discards whatever frames they left open.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use log::debug;

use super::call_tree::{CallTree, ProfileSnapshot};
use crate::domain::{Micros, NodeId};

/// Mutable session state behind the recorder's lock
#[derive(Debug, Default)]
struct Session {
    tree: CallTree,
    /// Open frames per dispatching thread, innermost last. Entries of threads
    /// that died mid-frame live until the next `start()` or `clear()`.
    stacks: HashMap<ThreadId, Vec<NodeId>>,
}

/// Process-wide signal profiler state
///
/// Shared as `Arc<SampleRecorder>` between the dispatch threads, the HTTP
/// handlers and the lifecycle controller.
#[derive(Debug, Default)]
pub struct SampleRecorder {
    recording: AtomicBool,
    session: Mutex<Session>,
}

impl SampleRecorder {
    /// Create a stopped recorder with a root-only tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard all recorded data and open frames
    pub fn clear(&self) {
        let mut session = self.lock();
        *session = Session::default();
        debug!("Profile data cleared");
    }

    /// Begin recording. Calling this while already recording does nothing.
    ///
    /// Frames still open from an earlier recording are forgotten, so new
    /// frames start at the root. Their late exits are absorbed as unmatched.
    pub fn start(&self) {
        let mut session = self.lock();
        if !self.recording.swap(true, Ordering::AcqRel) {
            session.stacks.clear();
            debug!("Profile recording started");
        }
    }

    /// Stop recording. Calling this while stopped does nothing.
    pub fn stop(&self) {
        if self.recording.swap(false, Ordering::AcqRel) {
            debug!("Profile recording stopped");
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Acquire)
    }

    /// A signal named `label` started emitting on the current thread
    pub fn on_frame_enter(&self, label: &str) {
        if !self.is_recording() {
            return;
        }

        let tid = thread::current().id();
        let mut session = self.lock();
        let Session { tree, stacks } = &mut *session;

        let stack = stacks.entry(tid).or_default();
        let parent = stack.last().copied().unwrap_or(NodeId::ROOT);

        let Some(id) = tree.child_or_insert(parent, label) else {
            debug!("Frame enter for {label:?} under unknown parent {parent}, ignoring");
            return;
        };
        if let Some(node) = tree.node_mut(id) {
            node.call_count += 1;
        }
        stack.push(id);
    }

    /// A signal named `label` finished emitting on the current thread after `elapsed`
    pub fn on_frame_exit(&self, label: &str, elapsed: Duration) {
        if !self.is_recording() {
            return;
        }

        let tid = thread::current().id();
        let mut session = self.lock();
        let Session { tree, stacks } = &mut *session;

        let Some(stack) = stacks.get_mut(&tid) else {
            debug!("Frame exit for {label:?} without matching enter, ignoring");
            return;
        };
        let Some(&top) = stack.last() else {
            debug!("Frame exit for {label:?} on empty stack, ignoring");
            return;
        };
        let Some(node) = tree.node_mut(top) else {
            debug!("Frame exit for {label:?} references missing {top}, ignoring");
            return;
        };
        if node.label != label {
            debug!(
                "Frame exit for {label:?} does not match open frame {:?}, ignoring",
                node.label
            );
            return;
        }

        node.cumulative_time = node.cumulative_time.saturating_add(Micros::from(elapsed));
        stack.pop();
        if stack.is_empty() {
            stacks.remove(&tid);
        }
    }

    /// Time a frame until the returned guard is dropped
    ///
    /// ```
    /// use bfg::profiling::SampleRecorder;
    ///
    /// let recorder = SampleRecorder::new();
    /// recorder.start();
    /// {
    ///     let _frame = recorder.frame("Scene.sceneChanged");
    ///     // emit...
    /// }
    /// let snapshot = recorder.snapshot();
    /// assert_eq!(snapshot.find(&["Scene.sceneChanged"]).unwrap().call_count, 1);
    /// ```
    #[must_use = "the frame is closed when the guard is dropped"]
    pub fn frame<'a>(&'a self, label: &'a str) -> FrameGuard<'a> {
        let entered = self.is_recording();
        if entered {
            self.on_frame_enter(label);
        }
        FrameGuard {
            recorder: self,
            label,
            start: Instant::now(),
            entered,
        }
    }

    /// Copy the current tree for serialization
    pub fn snapshot(&self) -> ProfileSnapshot {
        self.lock().tree.snapshot()
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        // A panic while holding the lock leaves the tree structurally valid
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Open frame created by [`SampleRecorder::frame`]
pub struct FrameGuard<'a> {
    recorder: &'a SampleRecorder,
    label: &'a str,
    start: Instant,
    entered: bool,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if self.entered {
            self.recorder
                .on_frame_exit(self.label, self.start.elapsed());
        }
    }
}
