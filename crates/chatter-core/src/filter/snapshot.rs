//! Published threshold snapshots.
//!
//! The hook callback and configuration changes run on different threads.
//! Rather than mutating a shared table in place, every configuration change
//! produces a complete [`FilterSnapshot`] which replaces the previous one in a
//! single pointer swap. A reader holds the shared guard only long enough to
//! clone the `Arc`, so it can never observe a half-updated table and never
//! waits on a writer that is still building.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::domain::button::Button;
use crate::domain::message::ObservedMessages;
use crate::domain::thresholds::ThresholdTable;
use crate::settings::{SettingsListener, SettingsProvider};

/// One consistent view of the thresholds and the message kinds they imply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSnapshot {
    pub table: ThresholdTable,
    pub observed: ObservedMessages,
}

impl FilterSnapshot {
    /// Builds a snapshot, deriving the observed-message set from `table`.
    pub fn new(table: ThresholdTable) -> Self {
        Self {
            observed: ObservedMessages::from_table(&table),
            table,
        }
    }
}

/// Holder of the currently published [`FilterSnapshot`].
#[derive(Debug)]
pub struct SnapshotCell {
    current: RwLock<Arc<FilterSnapshot>>,
    /// Serializes writers across "read settings, build, swap".
    writer: Mutex<()>,
}

impl SnapshotCell {
    pub fn new(table: ThresholdTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(FilterSnapshot::new(table))),
            writer: Mutex::new(()),
        }
    }

    /// Returns the currently published snapshot.
    #[inline]
    pub fn load(&self) -> Arc<FilterSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Publishes a snapshot built from `table` and returns it.
    pub fn publish(&self, table: ThresholdTable) -> Arc<FilterSnapshot> {
        self.publish_with(|| table)
    }

    /// Publishes a snapshot built from the table returned by `source`.
    ///
    /// `source` runs while the writer lock is held, so a concurrent writer
    /// cannot read newer settings and then be overwritten by an older build.
    pub fn publish_with<F>(&self, source: F) -> Arc<FilterSnapshot>
    where
        F: FnOnce() -> ThresholdTable,
    {
        let _writer = self.writer.lock();
        let next = Arc::new(FilterSnapshot::new(source()));
        *self.current.write() = Arc::clone(&next);
        next
    }
}

/// Keeps a [`SnapshotCell`] in sync with a [`SettingsProvider`].
pub struct SnapshotPublisher;

impl SnapshotPublisher {
    /// Builds the first snapshot from `provider` and subscribes to it so that
    /// every later settings change republishes.
    ///
    /// `os_double_click_ms` is carried into every snapshot for logging.
    pub fn attach(
        provider: &Arc<dyn SettingsProvider>,
        os_double_click_ms: u32,
    ) -> Arc<SnapshotCell> {
        let initial = ThresholdTable::from_settings(&provider.current(), os_double_click_ms);
        let cell = Arc::new(SnapshotCell::new(initial));
        log_snapshot(&cell.load(), "initial thresholds");

        // Weak on both sides: the provider owns the listener, and the listener
        // must not keep the provider (or a dropped cell) alive.
        let weak_provider: Weak<dyn SettingsProvider> = Arc::downgrade(provider);
        let weak_cell = Arc::downgrade(&cell);
        let listener: SettingsListener = Arc::new(move || {
            let (Some(provider), Some(cell)) = (weak_provider.upgrade(), weak_cell.upgrade()) else {
                return;
            };
            let snapshot = cell.publish_with(|| {
                ThresholdTable::from_settings(&provider.current(), os_double_click_ms)
            });
            log_snapshot(&snapshot, "thresholds updated");
        });
        provider.subscribe(listener);

        cell
    }
}

fn log_snapshot(snapshot: &FilterSnapshot, what: &str) {
    let t = &snapshot.table;
    info!(
        use_hook = t.use_hook,
        left = t.thresholds[Button::Left],
        right = t.thresholds[Button::Right],
        middle = t.thresholds[Button::Middle],
        x1 = t.thresholds[Button::Extra1],
        x2 = t.thresholds[Button::Extra2],
        min_delay = t.min_delay,
        "{what}"
    );
    debug!(
        os_double_click_ms = t.os_double_click_ms,
        ignored_device = ?t.ignored_device,
        observed = ?snapshot.observed,
        "snapshot details"
    );
}
