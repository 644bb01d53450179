//! Profile server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use super::assets::AssetBundle;

/// Port the front-end expects by default
pub const DEFAULT_PORT: u16 = 8000;

/// Upper bound on waiting for in-flight requests after shutdown is signaled
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Settings for one profile server instance
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to listen on (loopback unless overridden)
    pub bind_addr: IpAddr,
    /// TCP port; 0 picks a free port
    pub port: u16,
    /// Directory served ahead of the embedded front-end (d3 modules, `progress.gif`)
    pub resource_dir: Option<PathBuf>,
    /// Open the default browser at the server root after start
    pub open_browser: bool,
    pub drain_timeout: Duration,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub(crate) fn asset_bundle(&self) -> AssetBundle {
        match &self.resource_dir {
            Some(dir) => AssetBundle::with_override_dir(dir),
            None => AssetBundle::embedded(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            resource_dir: None,
            open_browser: true,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}
