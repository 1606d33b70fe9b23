//! Tracks the physical device behind the most recent input.
//!
//! Low-level mouse hook events carry no device identity. Raw input
//! notifications do, so the platform layer feeds every raw input notification
//! through [`DeviceTracker::on_raw_input`] and the classifier asks
//! [`DeviceTracker::is_ignored`] before evaluating a transition.

use thiserror::Error;
use tracing::{info, trace};

use crate::domain::device::DeviceId;

/// Error returned when a raw input payload cannot be read.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The payload size reported by the OS did not match what was copied.
    #[error("raw input size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u32, actual: u32 },

    /// The notification did not describe a device at all.
    #[error("raw input notification carries no device")]
    NoDevice,
}

/// Resolves a platform raw-input notification to the device that produced it.
pub trait DeviceResolver {
    /// Platform notification handle (for example `HRAWINPUT` on Windows).
    type Notification;

    fn resolve(&self, notification: Self::Notification) -> Result<DeviceId, ResolveError>;
}

/// Remembers the most recently active input device.
#[derive(Debug, Default)]
pub struct DeviceTracker {
    current: Option<DeviceId>,
}

impl DeviceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The device behind the most recent raw input, or `None` before the
    /// first notification.
    pub fn current(&self) -> Option<DeviceId> {
        self.current
    }

    /// Resolves `notification` and records its device.
    ///
    /// A notification that cannot be resolved is skipped without touching
    /// the current device. Returns `true` if the current device changed.
    pub fn on_raw_input<R: DeviceResolver>(
        &mut self,
        resolver: &R,
        notification: R::Notification,
    ) -> bool {
        match resolver.resolve(notification) {
            Ok(device) => self.record(device),
            Err(e) => {
                trace!("skipping raw input notification: {e}");
                false
            }
        }
    }

    /// Records `device` as the current device. Returns `true` on change.
    pub fn record(&mut self, device: DeviceId) -> bool {
        if self.current == Some(device) {
            return false;
        }
        info!(
            previous = ?self.current,
            current = %device,
            "input device switched"
        );
        self.current = Some(device);
        true
    }

    /// Returns `true` if the current device is `ignored`.
    ///
    /// Always `false` when nothing is ignored or no device has been seen yet.
    #[inline]
    pub fn is_ignored(&self, ignored: Option<DeviceId>) -> bool {
        match (self.current, ignored) {
            (Some(current), Some(ignored)) => current == ignored,
            _ => false,
        }
    }
}
