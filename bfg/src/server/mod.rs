//! # HTTP Control Server
//!
//! Serves the flame graph front-end and the recorder control endpoints from a
//! dedicated background thread.
//!
//! ## Lifecycle
//!
//! ```text
//! ProfileServer::bind()   listener bound on the caller's thread (errors surface here)
//!        │
//!        ▼
//! ProfileServer::spawn()  thread "bfg-http" runs a current-thread tokio runtime
//!        │                with axum::serve + graceful shutdown
//!        ▼
//! ServerHandle::shutdown() signal → listener closed → drain (bounded) → join
//! ```
//!
//! Each [`ServerHandle`] owns exactly one listening socket. Dropping the handle
//! shuts the server down.

pub mod assets;
pub mod config;
pub mod routes;

pub use assets::{AssetBundle, ALLOWED_ASSETS};
pub use config::ServerConfig;

use std::future::IntoFuture;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use axum::Router;
use log::{debug, error, info, warn};
use tokio::runtime::{self, Runtime};
use tokio::sync::oneshot;

use crate::domain::ServerError;
use crate::profiling::SampleRecorder;

/// How long the runtime gets to cancel leftover connection tasks
const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

/// A bound but not yet running profile server
pub struct ProfileServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    app: Router,
    drain_timeout: Duration,
}

impl ProfileServer {
    /// Bind the listening socket described by `config`
    pub fn bind(config: &ServerConfig, recorder: Arc<SampleRecorder>) -> Result<Self, ServerError> {
        let addr = config.socket_addr();
        let listener =
            TcpListener::bind(addr).map_err(|source| ServerError::Bind { addr, source })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let app = routes::router(recorder, config.asset_bundle());

        Ok(Self {
            listener,
            local_addr,
            app,
            drain_timeout: config.drain_timeout,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Start accepting on a dedicated thread
    pub fn spawn(self) -> Result<ServerHandle, ServerError> {
        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ServerError::Runtime)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let Self {
            listener,
            local_addr,
            app,
            drain_timeout,
        } = self;

        let thread = thread::Builder::new()
            .name("bfg-http".to_string())
            .spawn(move || serve(runtime, listener, app, shutdown_rx, drain_timeout))?;

        info!("Profile server listening on http://{local_addr}");
        Ok(ServerHandle {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            thread: Some(thread),
        })
    }
}

/// Accept loop body of the server thread
fn serve(
    runtime: Runtime,
    listener: TcpListener,
    app: Router,
    shutdown_rx: oneshot::Receiver<()>,
    drain_timeout: Duration,
) {
    let result = runtime.block_on(async move {
        let listener = tokio::net::TcpListener::from_std(listener)?;

        let (drain_tx, drain_rx) = oneshot::channel::<()>();
        let signal = async move {
            // A dropped sender also means shut down
            let _ = shutdown_rx.await;
            let _ = drain_tx.send(());
        };

        let server = axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .into_future();

        tokio::select! {
            result = server => result,
            () = drain_deadline(drain_rx, drain_timeout) => {
                warn!("Profile server connections still open after {drain_timeout:?}, dropping them");
                Ok(())
            }
        }
    });

    if let Err(e) = result {
        error!("Profile server stopped with error: {e}");
    }
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);
    debug!("Profile server thread exiting");
}

/// Resolves `drain_timeout` after shutdown was signaled, never before
async fn drain_deadline(drain_rx: oneshot::Receiver<()>, drain_timeout: Duration) {
    if drain_rx.await.is_ok() {
        tokio::time::sleep(drain_timeout).await;
    } else {
        std::future::pending::<()>().await;
    }
}

/// Running profile server
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Root URL to open in a browser
    pub fn url(&self) -> String {
        if self.local_addr.ip().is_unspecified() {
            format!("http://localhost:{}/", self.local_addr.port())
        } else {
            format!("http://{}/", self.local_addr)
        }
    }

    /// Stop accepting, drain in-flight requests and join the server thread
    pub fn shutdown(mut self) -> Result<(), ServerError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown_tx.take() {
            // Receiver is gone only if the thread already exited
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| ServerError::ThreadPanicked)?;
            info!("Profile server on {} stopped", self.local_addr);
        }
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Profile server shutdown failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, TcpStream};
    use std::time::Instant;

    fn ephemeral_config() -> ServerConfig {
        ServerConfig {
            port: 0,
            open_browser: false,
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_bind_conflict_is_startup_error() {
        let recorder = Arc::new(SampleRecorder::new());
        let first = ProfileServer::bind(&ephemeral_config(), Arc::clone(&recorder)).unwrap();

        let taken = ServerConfig {
            port: first.local_addr().port(),
            ..ephemeral_config()
        };
        let err = ProfileServer::bind(&taken, recorder).err().unwrap();
        assert!(matches!(err, ServerError::Bind { .. }));
    }

    #[test]
    fn test_shutdown_releases_listener() {
        let recorder = Arc::new(SampleRecorder::new());
        let handle = ProfileServer::bind(&ephemeral_config(), recorder)
            .unwrap()
            .spawn()
            .unwrap();
        let addr = handle.local_addr();
        assert!(TcpStream::connect(addr).is_ok());

        let started = Instant::now();
        handle.shutdown().unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(TcpStream::connect(addr).is_err());
    }

    #[test]
    fn test_url_uses_localhost_for_unspecified() {
        let recorder = Arc::new(SampleRecorder::new());
        let config = ServerConfig {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            ..ephemeral_config()
        };
        let handle = ProfileServer::bind(&config, recorder).unwrap().spawn().unwrap();
        let port = handle.local_addr().port();
        assert_eq!(handle.url(), format!("http://localhost:{port}/"));
    }
}
