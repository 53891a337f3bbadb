use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

mod config;
mod controller;

use addon_backend::BackendSettings;
use anyhow::{Context, Result};
use clap::Parser;
use command_bridge::{BridgeOptions, BridgeRuntime};
use controller::{
    events::StatusLevel,
    home::{HomeController, HomeState},
};
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Headless host for the addon manager home page.
#[derive(Parser, Debug)]
#[command(name = "addon-manager")]
struct Args {
    /// TOML settings file (defaults to ./addon_manager.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    addon_dir: Option<PathBuf>,
    #[arg(long)]
    api_endpoint: Option<String>,
    /// Number of update activations to issue after mount.
    #[arg(long, default_value_t = 0)]
    update: usize,
    /// Stop polling for outstanding invocations after this many seconds.
    #[arg(long, default_value_t = 30)]
    wait_secs: u64,
    #[arg(long, default_value = "info")]
    log: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut settings = config::load_settings(args.config.as_deref())?;
    if let Some(addon_dir) = args.addon_dir {
        settings.addon_dir = addon_dir;
    }
    if let Some(api_endpoint) = args.api_endpoint {
        settings.api_endpoint = api_endpoint;
    }
    tracing::info!(
        addon_dir = %settings.addon_dir.display(),
        api_endpoint = %settings.api_endpoint,
        "starting addon manager"
    );

    let registry = addon_backend::build_registry(&BackendSettings {
        addon_dir: settings.addon_dir.clone(),
        api_endpoint: settings.api_endpoint.clone(),
    })
    .context("failed to build backend command registry")?;
    let (bridge, runtime) = BridgeRuntime::launch(
        registry,
        BridgeOptions {
            queue_capacity: settings.command_queue_capacity,
            ..Default::default()
        },
    )
    .context("failed to start command bridge")?;

    let mut page = HomeController::new(bridge);
    page.on_mount();
    for _ in 0..args.update {
        page.on_update_clicked();
    }

    let deadline = wait_deadline(Instant::now(), Duration::from_secs(args.wait_secs));
    while page.has_pending() && deadline.map_or(true, |deadline| Instant::now() < deadline) {
        page.process_resolutions();
        thread::sleep(POLL_INTERVAL);
    }
    page.process_resolutions();

    render(page.state());

    if page.has_pending() {
        tracing::warn!(
            pending = page.pending_count(),
            "stopped waiting for outstanding invocations"
        );
        return Ok(());
    }
    drop(page);
    runtime.join();
    Ok(())
}

/// `None` when the wait cannot be represented as an `Instant`; polling then has no deadline.
fn wait_deadline(now: Instant, wait: Duration) -> Option<Instant> {
    now.checked_add(wait)
}

fn render(state: &HomeState) {
    match state.installed_addon_count() {
        Some(count) => println!("Installed addons: {count}"),
        None => println!("Installed addons: unavailable"),
    }
    for entry in state.status_log() {
        let level = match entry.level {
            StatusLevel::Info => "info",
            StatusLevel::Error => "error",
        };
        println!("[{level}] {}", entry.message);
    }
    if state.updates_in_flight() > 0 {
        println!("Updates still running: {}", state.updates_in_flight());
    }
    if let Some(err) = state.last_error().filter(|err| err.retryable()) {
        println!("Last failure can be retried: {}", err.message());
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
