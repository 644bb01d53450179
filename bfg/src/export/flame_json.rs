//! Flame graph JSON export
//!
//! Renders a [`ProfileSnapshot`] as the document the browser front-end loads
//! from `/profile.json`:
//!
//! ```json
//! {
//!   "c": {
//!     "callStats": {
//!       "stack": ["[app]", "application", 15, 4350],
//!       "sampleCount": 4350,
//!       "children": [
//!         { "stack": ["Scene.sceneChanged", "sceneChanged", 12, 4100], "sampleCount": 4100, "children": [] }
//!       ]
//!     },
//!     "runTime": 4350,
//!     "totalSamples": 15
//!   }
//! }
//! ```
//!
//! `stack` is always `[label, display label, call count, cumulative µs]`.
//! The tree is first built as a `serde_json::Value` so the document shape can
//! be tested without going through text.

use std::io::Write;

use log::warn;
use serde_json::{json, Value};

use crate::domain::ExportError;
use crate::profiling::{ProfileSnapshot, SnapshotNode, ROOT_LABEL};

/// Document served when nothing has been recorded yet.
pub const EMPTY_PROFILE_JSON: &str = r#"{"c":{"callStats":{"stack":["[app]","no data",0,10],"children":[]},"runTime":10,"totalSamples":10}}"#;

/// Display label of the root frame in recorded profiles.
const ROOT_DISPLAY_LABEL: &str = "application";

/// Placeholder run time, so the front-end axis has a non-zero range.
const PLACEHOLDER_RUN_TIME: u64 = 10;

/// The "no data" document as a value.
pub fn placeholder_document() -> Value {
    json!({
        "c": {
            "callStats": {
                "stack": [ROOT_LABEL, "no data", 0, PLACEHOLDER_RUN_TIME],
                "children": [],
            },
            "runTime": PLACEHOLDER_RUN_TIME,
            "totalSamples": PLACEHOLDER_RUN_TIME,
        }
    })
}

/// Build the front-end document for a snapshot.
///
/// A snapshot with nothing under the root yields [`placeholder_document`].
pub fn to_document(snapshot: &ProfileSnapshot) -> Value {
    if snapshot.is_empty() {
        return placeholder_document();
    }

    let run_time = snapshot.run_time().0;
    let children: Vec<Value> = snapshot.root.children.iter().map(node_document).collect();

    json!({
        "c": {
            "callStats": {
                "stack": [ROOT_LABEL, ROOT_DISPLAY_LABEL, snapshot.root_calls(), run_time],
                "sampleCount": run_time,
                "children": children,
            },
            "runTime": run_time,
            "totalSamples": snapshot.total_calls(),
        }
    })
}

fn node_document(node: &SnapshotNode) -> Value {
    let children: Vec<Value> = node.children.iter().map(node_document).collect();
    json!({
        "stack": [
            node.label,
            node.display_label,
            node.call_count,
            node.cumulative_time.0,
        ],
        "sampleCount": node.cumulative_time.0,
        "children": children,
    })
}

/// Serialize a snapshot to compact JSON text.
pub fn serialize(snapshot: &ProfileSnapshot) -> Result<String, ExportError> {
    if snapshot.is_empty() {
        return Ok(EMPTY_PROFILE_JSON.to_string());
    }
    Ok(serde_json::to_string(&to_document(snapshot))?)
}

/// Serialize a snapshot, falling back to the placeholder document on failure.
///
/// Used by the HTTP layer so a bad profile never turns into a 5xx.
pub fn render_or_placeholder(snapshot: &ProfileSnapshot) -> String {
    serialize(snapshot).unwrap_or_else(|e| {
        warn!("Serving empty profile, serialization failed: {e}");
        EMPTY_PROFILE_JSON.to_string()
    })
}

/// Write a snapshot as pretty-printed JSON to any writer (file, stdout, buffer).
pub fn export<W: Write>(snapshot: &ProfileSnapshot, writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, &to_document(snapshot))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiling::SampleRecorder;
    use std::time::Duration;

    #[test]
    fn test_placeholder_document_matches_literal() {
        let parsed: Value = serde_json::from_str(EMPTY_PROFILE_JSON).unwrap();
        assert_eq!(parsed, placeholder_document());
        assert_eq!(
            serde_json::to_string(&placeholder_document()).unwrap(),
            EMPTY_PROFILE_JSON
        );
    }

    #[test]
    fn test_cleared_recorder_serializes_placeholder() {
        let recorder = SampleRecorder::new();
        recorder.start();
        recorder.on_frame_enter("A");
        recorder.on_frame_exit("A", Duration::from_micros(3));
        recorder.clear();

        assert_eq!(serialize(&recorder.snapshot()).unwrap(), EMPTY_PROFILE_JSON);
    }

    #[test]
    fn test_recorded_tree_document() {
        let recorder = SampleRecorder::new();
        recorder.start();
        recorder.on_frame_enter("Scene.sceneChanged");
        recorder.on_frame_enter("Camera.update");
        recorder.on_frame_exit("Camera.update", Duration::from_micros(40));
        recorder.on_frame_exit("Scene.sceneChanged", Duration::from_micros(100));
        recorder.on_frame_enter("Job.finished");
        recorder.on_frame_exit("Job.finished", Duration::from_micros(5));

        let doc = to_document(&recorder.snapshot());
        let c = &doc["c"];
        assert_eq!(c["runTime"], 105);
        assert_eq!(c["totalSamples"], 3);

        let root = &c["callStats"];
        assert_eq!(root["stack"], json!(["[app]", "application", 2, 105]));

        let scene = &root["children"][0];
        assert_eq!(scene["stack"], json!(["Scene.sceneChanged", "sceneChanged", 1, 100]));
        assert_eq!(scene["sampleCount"], 100);
        assert_eq!(
            scene["children"][0]["stack"],
            json!(["Camera.update", "update", 1, 40])
        );
        assert_eq!(root["children"][1]["stack"][0], "Job.finished");
        assert_eq!(root["children"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_serialize_is_deterministic() {
        let recorder = SampleRecorder::new();
        recorder.start();
        for label in ["b", "a", "c"] {
            recorder.on_frame_enter(label);
            recorder.on_frame_exit(label, Duration::from_micros(1));
        }
        let snap = recorder.snapshot();
        let first = serialize(&snap).unwrap();
        assert_eq!(first, serialize(&snap).unwrap());
        assert!(first.find("\"b\"").unwrap() < first.find("\"a\"").unwrap());
    }

    #[test]
    fn test_export_writes_pretty_json() {
        let mut buffer = Vec::new();
        export(&ProfileSnapshot::empty(), &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains('\n'));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, placeholder_document());
    }
}
