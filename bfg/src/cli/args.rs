//! CLI argument definitions

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::server::config::{ServerConfig, DEFAULT_DRAIN_TIMEOUT, DEFAULT_PORT};

#[derive(Parser, Debug)]
#[command(
    name = "bfg",
    about = "Signal profiler with a Big Flame Graph",
    after_help = "\
EXAMPLES:
    bfg                                  Serve on http://127.0.0.1:8000 and open a browser
    bfg --port 9000 --no-browser         Serve on another port without opening a browser
    bfg --duration 30 --export out.json  Stop after 30s and save the last profile"
)]
pub struct Args {
    /// Port for the flame graph server
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: IpAddr,

    /// Directory served ahead of the built-in viewer (d3 modules, progress.gif)
    #[arg(long, value_name = "DIR")]
    pub resources: Option<PathBuf>,

    /// Do not open a browser when the server starts
    #[arg(long)]
    pub no_browser: bool,

    /// Number of signal dispatch threads in the demo host
    #[arg(long, default_value = "4")]
    pub dispatchers: usize,

    /// Milliseconds between demo signal emissions
    #[arg(long, default_value = "20")]
    pub interval_ms: u64,

    /// Stop after N seconds (0 = until Ctrl-C)
    #[arg(long, default_value = "0")]
    pub duration: u64,

    /// Write the profile recorded when the server stops to FILE
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Print the plugin metadata as JSON and exit
    #[arg(long)]
    pub plugin_info: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind,
            port: self.port,
            resource_dir: self.resources.clone(),
            open_browser: !self.no_browser,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}
