//! Structured error types for bfg
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Instrumentation hooks have no error type: inconsistent enter/exit pairs
//! are absorbed by the recorder and never reach the dispatching code.

use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind profile server to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start profile server runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Profile server thread panicked")]
    ThreadPanicked,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Resource {0} is not in the asset allow-list")]
    NotFound(String),

    #[error("Resource {0} is not embedded and no resource directory is set")]
    NotBundled(String),

    #[error("Failed to read resource {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
