//! Per-button suppression thresholds and global knobs.

use super::button::{Button, ButtonMap};
use super::device::DeviceId;
use crate::settings::ClickSettings;

/// Fallback for the platform double-click time when it cannot be queried.
pub const DEFAULT_DOUBLE_CLICK_MS: u32 = 500;

/// Thresholds in effect for one snapshot.
///
/// All durations are milliseconds. A negative threshold means the button is
/// not observed at all; a negative `min_delay` disables the minimum-delay
/// carve-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdTable {
    /// Minimum release-to-press interval per button.
    pub thresholds: ButtonMap<i32>,
    /// Intervals at or below this value are never treated as chatter.
    pub min_delay: i32,
    /// Master switch for the interception hook.
    pub use_hook: bool,
    /// Events from this device are always passed through.
    pub ignored_device: Option<DeviceId>,
    /// Platform double-click time. Only used for informational logging.
    pub os_double_click_ms: u32,
}

impl ThresholdTable {
    /// Builds a table from configuration plus the platform double-click time.
    pub fn from_settings(settings: &ClickSettings, os_double_click_ms: u32) -> Self {
        Self {
            thresholds: ButtonMap::from_array([
                settings.left_threshold,
                settings.right_threshold,
                settings.middle_threshold,
                settings.x1_threshold,
                settings.x2_threshold,
            ]),
            min_delay: settings.min_delay,
            use_hook: settings.use_hook,
            ignored_device: settings.ignored_device,
            os_double_click_ms,
        }
    }

    #[inline]
    pub fn threshold(&self, button: Button) -> i32 {
        self.thresholds[button]
    }

    /// Returns `true` if transitions of `button` are evaluated.
    #[inline]
    pub fn is_observed(&self, button: Button) -> bool {
        self.thresholds[button] >= 0
    }
}

impl Default for ThresholdTable {
    /// Every button disabled, hook enabled, no ignored device.
    fn default() -> Self {
        Self {
            thresholds: ButtonMap::filled(-1),
            min_delay: -1,
            use_hook: true,
            ignored_device: None,
            os_double_click_ms: DEFAULT_DOUBLE_CLICK_MS,
        }
    }
}
