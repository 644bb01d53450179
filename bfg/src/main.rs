//! # bfg - Demo Host
//!
//! Stands in for the host application: registers the flame graph extension,
//! drives an instrumented signal bus, and triggers the "Start BFG" / "Stop BFG"
//! menu commands around it.

use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bfg::cli::Args;
use bfg::export::flame_json;
use bfg::extension::{
    Extension, FlameGraphExtension, PluginRegistry, START_MENU_LABEL, STOP_MENU_LABEL,
};
use bfg::lifecycle::FlameGraphController;
use bfg::profiling::SampleRecorder;
use bfg::signal_bus::SignalBus;
use clap::Parser;
use log::info;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

/// Simulated work per dispatched slot
const SLOT_WORK: Duration = Duration::from_micros(300);

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

fn run() -> Result<()> {
    let args = Args::parse();

    let recorder = Arc::new(SampleRecorder::new());
    let controller = Arc::new(FlameGraphController::new(
        args.server_config(),
        Arc::clone(&recorder),
    ));
    let extension = FlameGraphExtension::new(Arc::clone(&controller));

    if args.plugin_info {
        println!("{}", serde_json::to_string_pretty(&extension.metadata())?);
        return Ok(());
    }

    let mut registry = PluginRegistry::new();
    registry.register(&extension);

    let mut bus = SignalBus::new(Arc::clone(&recorder), args.dispatchers, SLOT_WORK);
    bus.start_ticker(args.interval());

    registry.trigger(START_MENU_LABEL);
    let Some(url) = controller.url() else {
        bus.shutdown();
        anyhow::bail!(
            "Flame graph server did not start on {} (run with RUST_LOG=error for details)",
            controller.config().socket_addr()
        );
    };

    if !args.quiet {
        println!("bfg v{}", env!("CARGO_PKG_VERSION"));
        println!("Flame graph: {url}");
        println!("Press Ctrl-C to stop");
    }

    wait_for_exit(args.duration)?;

    registry.trigger(STOP_MENU_LABEL);
    bus.shutdown();
    info!("Signal bus stopped");

    if let Some(path) = &args.export {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        flame_json::export(&recorder.snapshot(), BufWriter::new(file))
            .with_context(|| format!("Failed to write profile to {}", path.display()))?;
        if !args.quiet {
            println!("Profile written to {}", path.display());
        }
    }

    Ok(())
}

/// Block until Ctrl-C, or until `duration_secs` elapse when non-zero
fn wait_for_exit(duration_secs: u64) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build signal handling runtime")?;

    runtime.block_on(async {
        if duration_secs == 0 {
            tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")
        } else {
            tokio::select! {
                result = tokio::signal::ctrl_c() => result.context("Failed to listen for Ctrl-C"),
                () = tokio::time::sleep(Duration::from_secs(duration_secs)) => Ok(()),
            }
        }
    })
}
