//! Chatter classification: the per-event suppression decision.
//!
//! [`ChatterFilter::evaluate`] is called from the low-level mouse hook for
//! every global mouse event and must return within the OS hook timeout. It
//! does no I/O, takes no exclusive lock and performs no allocation; the only
//! state it mutates is the per-button release timestamps, the current device
//! and the suppressed-click counter, all owned by the filter.
//!
//! # The decision (for beginners)
//!
//! For every button we remember when it was last released. When the same
//! button is pressed again we compute how long it has been up:
//!
//! ```text
//! release ──── elapsed ────► press
//!
//! elapsed <  threshold   → chatter, swallow the press
//! elapsed >= threshold   → a real click, let it through
//! elapsed <= min_delay   → let it through anyway (see below)
//! ```
//!
//! `min_delay` is a deliberate carve-out: an interval *so* short that it
//! cannot come from a bouncing switch is passed even though it is below the
//! threshold. Releases are never swallowed.

use std::sync::Arc;

use tracing::{debug, info};

use super::device_tracker::{DeviceResolver, DeviceTracker};
use super::snapshot::{FilterSnapshot, SnapshotCell};
use crate::domain::button::{Button, ButtonMap};
use crate::domain::message::{Direction, MessageKind};
use crate::domain::thresholds::ThresholdTable;

/// High-word value of the mouse-data field identifying the first side button.
pub const XBUTTON1: u16 = 0x0001;
/// High-word value of the mouse-data field identifying the second side button.
pub const XBUTTON2: u16 = 0x0002;

/// What the hook should do with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Forward the event to the next hook in the chain.
    Pass,
    /// Swallow the event; applications never see it.
    Suppress,
}

impl Verdict {
    pub fn is_suppress(self) -> bool {
        self == Verdict::Suppress
    }
}

/// The fields of a low-level mouse event the classifier looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseHookEvent {
    /// Raw window message (`wParam` of the hook procedure).
    pub message: u32,
    /// The `mouseData` field; carries the side-button id in its high word.
    pub mouse_data: u32,
    /// Event timestamp from the platform millisecond tick counter.
    pub time: u32,
}

impl MouseHookEvent {
    pub fn new(message: u32, mouse_data: u32, time: u32) -> Self {
        Self {
            message,
            mouse_data,
            time,
        }
    }
}

/// Per-button timing state plus the suppression rule.
pub struct ChatterFilter {
    snapshots: Arc<SnapshotCell>,
    /// Tick count of the last observed release per button; 0 = none.
    release_times: ButtonMap<u32>,
    devices: DeviceTracker,
    suppressed: u64,
}

impl ChatterFilter {
    /// Creates a filter reading thresholds from `snapshots`.
    pub fn new(snapshots: Arc<SnapshotCell>) -> Self {
        Self {
            snapshots,
            release_times: ButtonMap::filled(0),
            devices: DeviceTracker::new(),
            suppressed: 0,
        }
    }

    /// Number of presses swallowed since construction.
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }

    /// Last recorded release tick for `button`.
    pub fn last_release(&self, button: Button) -> u32 {
        self.release_times[button]
    }

    pub fn devices(&self) -> &DeviceTracker {
        &self.devices
    }

    /// Feeds a raw input notification to the device tracker.
    pub fn on_raw_input<R: DeviceResolver>(
        &mut self,
        resolver: &R,
        notification: R::Notification,
    ) -> bool {
        self.devices.on_raw_input(resolver, notification)
    }

    /// Decides whether the event should be swallowed.
    ///
    /// `stage` is the hook code handed to the hook procedure; a negative value
    /// means the event must be forwarded untouched.
    #[inline]
    pub fn evaluate(&mut self, stage: i32, event: &MouseHookEvent) -> Verdict {
        if stage < 0 {
            return Verdict::Pass;
        }
        let snapshot = self.snapshots.load();
        self.evaluate_with(&snapshot, event)
    }

    fn evaluate_with(&mut self, snapshot: &FilterSnapshot, event: &MouseHookEvent) -> Verdict {
        let table = &snapshot.table;
        if !table.use_hook || self.devices.is_ignored(table.ignored_device) {
            return Verdict::Pass;
        }
        let Some(kind) = MessageKind::from_raw(event.message) else {
            return Verdict::Pass;
        };
        if !snapshot.observed.contains(kind) {
            return Verdict::Pass;
        }
        let Some(button) = resolve_button(kind, event.mouse_data, table) else {
            return Verdict::Pass;
        };

        match kind.direction() {
            Direction::Down => self.on_press(button, event.time, table),
            Direction::Up => {
                self.release_times[button] = event.time;
                Verdict::Pass
            }
        }
    }

    fn on_press(&mut self, button: Button, now: u32, table: &ThresholdTable) -> Verdict {
        // Wrapping subtraction keeps the interval correct across the ~49.7 day
        // tick counter rollover.
        let elapsed = now.wrapping_sub(self.release_times[button]);
        let threshold = i64::from(table.threshold(button));
        let below_min_delay =
            table.min_delay >= 0 && i64::from(elapsed) <= i64::from(table.min_delay);
        let ignore = i64::from(elapsed) < threshold && !below_min_delay;

        if ignore {
            self.suppressed += 1;
            // The swallowed press has no matching release yet; measure the
            // next press from zero rather than from this one.
            self.release_times[button] = 0;
            info!(
                %button,
                elapsed_ms = elapsed,
                threshold_ms = threshold,
                suppressed = self.suppressed,
                "suppressed chatter click #{}",
                self.suppressed
            );
            return Verdict::Suppress;
        }

        if elapsed < table.os_double_click_ms {
            debug!(
                %button,
                elapsed_ms = elapsed,
                double_click_ms = table.os_double_click_ms,
                "fast click accepted"
            );
        }
        Verdict::Pass
    }
}

/// Maps a transition kind to the button it refers to.
///
/// Side buttons share one message pair; the high word of `mouse_data` picks
/// the button, and a side button whose own threshold is negative is treated
/// as not applicable.
#[inline]
fn resolve_button(kind: MessageKind, mouse_data: u32, table: &ThresholdTable) -> Option<Button> {
    if let Some(button) = kind.fixed_button() {
        return Some(button);
    }
    let which = (mouse_data >> 16) as u16;
    if which & XBUTTON1 != 0 && table.is_observed(Button::Extra1) {
        Some(Button::Extra1)
    } else if which & XBUTTON2 != 0 && table.is_observed(Button::Extra2) {
        Some(Button::Extra2)
    } else {
        None
    }
}
