//! Configuration contract consumed by the core.
//!
//! The core never reads files or talks to a UI. It is handed an
//! `Arc<dyn SettingsProvider>` and registers a change listener on it; the
//! binary decides where settings come from.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::device::DeviceId;

/// Callback invoked with no arguments after any settings field changes.
pub type SettingsListener = Arc<dyn Fn() + Send + Sync>;

/// The settings fields the core depends on.
///
/// Durations are milliseconds; negative values disable the corresponding
/// feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickSettings {
    pub use_hook: bool,
    pub left_threshold: i32,
    pub right_threshold: i32,
    pub middle_threshold: i32,
    pub x1_threshold: i32,
    pub x2_threshold: i32,
    pub min_delay: i32,
    pub ignored_device: Option<DeviceId>,
}

impl Default for ClickSettings {
    fn default() -> Self {
        Self {
            use_hook: true,
            left_threshold: 50,
            right_threshold: 50,
            middle_threshold: 50,
            x1_threshold: -1,
            x2_threshold: -1,
            min_delay: -1,
            ignored_device: None,
        }
    }
}

/// Source of [`ClickSettings`] with change notification.
pub trait SettingsProvider: Send + Sync {
    /// Returns the current settings.
    fn current(&self) -> ClickSettings;

    /// Registers `listener` to be called after every settings change.
    ///
    /// Listeners are called in registration order on the thread that made
    /// the change.
    fn subscribe(&self, listener: SettingsListener);
}
