//! Storage infrastructure: configuration persistence and live settings.
//!
//! - **`config`** – Reads and writes the TOML configuration file from the
//!   platform-appropriate directory, with defaults for anything missing.
//! - **`settings_store`** – The in-memory [`chatter_core::SettingsProvider`]
//!   the core subscribes to.
//! - **`watcher`** – Polls the configuration file and pushes edits into the
//!   settings store while the program runs.

pub mod config;
pub mod settings_store;
pub mod watcher;
