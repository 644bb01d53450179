//! # Lifecycle Controller
//!
//! Owns the single running profile server of the process.
//!
//! - `start_server()` replaces any running server (stop, then start, under one
//!   lock), clears the recorder so the new session starts empty, then opens
//!   the browser at the server root.
//! - `stop_server()` shuts the running server down, or does nothing.
//!
//! The controller is the explicit context object handed to the host glue; the
//! recorder it shares with the server is passed in at construction.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use crate::domain::ServerError;
use crate::profiling::SampleRecorder;
use crate::server::{ProfileServer, ServerConfig, ServerHandle};

pub struct FlameGraphController {
    config: ServerConfig,
    recorder: Arc<SampleRecorder>,
    server: Mutex<Option<ServerHandle>>,
}

impl FlameGraphController {
    #[must_use]
    pub fn new(config: ServerConfig, recorder: Arc<SampleRecorder>) -> Self {
        Self {
            config,
            recorder,
            server: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn recorder(&self) -> &Arc<SampleRecorder> {
        &self.recorder
    }

    /// Start the profile server, replacing one that is already running
    ///
    /// Returns the bound address. A bind failure leaves no server running.
    pub fn start_server(&self) -> Result<SocketAddr, ServerError> {
        let mut server = self.lock();

        if let Some(previous) = server.take() {
            info!("Replacing profile server on {}", previous.local_addr());
            if let Err(e) = previous.shutdown() {
                warn!("Previous profile server did not stop cleanly: {e}");
            }
        }

        self.recorder.clear();
        let handle = ProfileServer::bind(&self.config, Arc::clone(&self.recorder))?.spawn()?;
        let addr = handle.local_addr();
        let url = handle.url();
        *server = Some(handle);
        drop(server);

        if self.config.open_browser {
            if let Err(e) = webbrowser::open(&url) {
                warn!("Could not open browser at {url}: {e}");
            }
        }
        Ok(addr)
    }

    /// Stop the profile server if one is running
    pub fn stop_server(&self) -> Result<(), ServerError> {
        let Some(handle) = self.lock().take() else {
            return Ok(());
        };
        handle.shutdown()
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock().as_ref().map(ServerHandle::local_addr)
    }

    /// Root URL of the running server
    pub fn url(&self) -> Option<String> {
        self.lock().as_ref().map(ServerHandle::url)
    }

    fn lock(&self) -> MutexGuard<'_, Option<ServerHandle>> {
        self.server.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
