//! Profile export functionality
//!
//! This module renders recorded call trees for the flame graph front-end.
//! Currently supports the front-end's nested `callStats` JSON document.

pub mod flame_json;

pub use flame_json::{render_or_placeholder, serialize, to_document, EMPTY_PROFILE_JSON};
