//! # bfg - Big Flame Graph Signal Profiler
//!
//! bfg records how a host application's signals (its internal event
//! notifications) are emitted, and serves the result as an interactive flame
//! graph on a local HTTP server.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Host Application                           │
//! │   menu: "Start BFG" / "Stop BFG"        signal dispatch threads │
//! └──────────┬───────────────────────────────────────┬──────────────┘
//!            │ extension                             │ enter / exit hooks
//!            ▼                                       ▼
//! ┌──────────────────────┐              ┌──────────────────────────┐
//! │ Lifecycle Controller │              │     Sample Recorder      │
//! │  (one server thread) │              │ call tree + thread stacks│
//! └──────────┬───────────┘              └────────────▲─────────────┘
//!            │ spawn / shutdown                      │ clear / start /
//!            ▼                                       │ stop / snapshot
//! ┌─────────────────────────────────────────────────┴───────────────┐
//! │                     HTTP Control Server                         │
//! │   /record  /stop  /profile.json ──► Tree Serializer (JSON)      │
//! │   /index.html /code.js ...      ──► allow-listed assets         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`profiling`]: the sample recorder and its call tree
//!   - `call_tree`: arena-backed tree and owned snapshots
//!   - `recorder`: enter/exit hooks, per-thread call stacks, RAII frames
//!
//! - [`export`]: renders snapshots as the front-end's JSON document
//!
//! - [`server`]: axum router, static asset allow-list, background server thread
//!
//! - [`lifecycle`]: single-instance start/stop of the server
//!
//! - [`extension`]: plugin metadata and menu commands for the host
//!
//! - [`signal_bus`]: instrumented demo signal dispatcher used by the binary
//!
//! - [`cli`]: command-line arguments of the demo host
//!
//! - [`domain`]: newtypes and error types
//!
//! ## Typical Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use bfg::lifecycle::FlameGraphController;
//! use bfg::profiling::SampleRecorder;
//! use bfg::server::ServerConfig;
//!
//! # fn main() -> Result<(), bfg::domain::ServerError> {
//! let recorder = Arc::new(SampleRecorder::new());
//! let controller = FlameGraphController::new(ServerConfig::default(), Arc::clone(&recorder));
//! controller.start_server()?;
//!
//! // In the host's signal dispatch:
//! {
//!     let _frame = recorder.frame("Scene.sceneChanged");
//!     // call connected slots...
//! }
//!
//! controller.stop_server()?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod domain;
pub mod export;
pub mod extension;
pub mod lifecycle;
pub mod profiling;
pub mod server;
pub mod signal_bus;
