//! Profiling core modules
//!
//! - Call tree storage and immutable snapshots
//! - The sample recorder driven by signal dispatch hooks

pub mod call_tree;
pub mod recorder;

// Re-export common types
pub use call_tree::{display_label, CallNode, CallTree, ProfileSnapshot, SnapshotNode, ROOT_LABEL};
pub use recorder::{FrameGuard, SampleRecorder};
