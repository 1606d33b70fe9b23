//! Chatter Guard entry point.
//!
//! Loads the configuration, publishes the first settings snapshot, starts
//! the hook thread and the config watcher, then waits for Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config_from()         -- TOML file, defaults when absent
//!  └─ SettingsStore              -- live ClickSettings
//!       ├─ SnapshotPublisher     -- rebuilds the filter snapshot on change
//!       └─ hook thread waker     -- reconciles the hook on change
//!  └─ start services
//!       ├─ hook thread           (WH_MOUSE_LL + notification window)
//!       └─ ConfigWatcher         (Tokio task)
//! ```
//!
//! # Usage
//!
//! ```text
//! chatter-guard [OPTIONS]
//!
//! Options:
//!   --config <PATH>            Config file [default: platform config dir]
//!   --print-config             Print the effective configuration and exit
//!   --write-default-config     Write a default config file if none exists
//!   --poll-interval-ms <MS>    Config file poll period [default: 1000]
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use chatter_core::{SettingsProvider, SnapshotPublisher};
use chatter_guard::infrastructure::input_capture::{os_double_click_ms, start_capture};
use chatter_guard::infrastructure::logging;
use chatter_guard::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, AppConfig,
};
use chatter_guard::infrastructure::storage::settings_store::SettingsStore;
use chatter_guard::infrastructure::storage::watcher::ConfigWatcher;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// System-wide mouse chatter suppression.
#[derive(Debug, Parser)]
#[command(
    name = "chatter-guard",
    about = "Suppresses unintended double-clicks from worn mouse switches",
    version
)]
struct Cli {
    /// Path of the TOML configuration file.
    #[arg(long, env = "CHATTER_GUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,

    /// Write the default configuration if no file exists, then exit.
    #[arg(long)]
    write_default_config: bool,

    /// How often the configuration file is checked for edits.
    #[arg(long, default_value_t = 1000, env = "CHATTER_GUARD_POLL_MS")]
    poll_interval_ms: u64,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => {
            config_file_path().context("no --config given and no platform config directory")?
        }
    };

    if cli.write_default_config {
        if config_path.exists() {
            println!("{} already exists; leaving it untouched", config_path.display());
        } else {
            save_config_to(&config_path, &AppConfig::default())
                .with_context(|| format!("failed to write {}", config_path.display()))?;
            println!("wrote default configuration to {}", config_path.display());
        }
        return Ok(());
    }

    let config = load_config_from(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    if cli.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    // `RUST_LOG` wins over the configured level. Writes happen on a
    // background thread; `_log_guard` flushes them when main returns.
    let _log_guard = logging::init(&config.general.log_level);

    info!(config = %config_path.display(), "Chatter Guard starting");
    config.log_warnings();

    // ── Settings and snapshot publication ─────────────────────────────────────
    let store = Arc::new(SettingsStore::new(config.click_settings()));
    let provider: Arc<dyn SettingsProvider> = store.clone();
    let snapshots = SnapshotPublisher::attach(&provider, os_double_click_ms());

    // ── Hook thread ───────────────────────────────────────────────────────────
    let capture = start_capture(Arc::clone(&snapshots)).context("failed to start mouse hook")?;
    store.subscribe(capture.waker());

    // ── Config watcher ────────────────────────────────────────────────────────
    let watcher = ConfigWatcher::new(
        config_path,
        Arc::clone(&store),
        Duration::from_millis(cli.poll_interval_ms.max(1)),
    )
    .await;
    let watcher_task = tokio::spawn(watcher.run());

    info!("Chatter Guard ready.  Press Ctrl-C to exit.");

    // ── Ctrl-C ────────────────────────────────────────────────────────────────
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("shutdown signal received");

    watcher_task.abort();
    capture.shutdown();

    info!("Chatter Guard stopped");
    Ok(())
}
