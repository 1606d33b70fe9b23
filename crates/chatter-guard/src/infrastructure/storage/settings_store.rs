//! In-memory settings holder with change notification.
//!
//! The store is the single [`SettingsProvider`] of the running program. The
//! config watcher writes into it; the snapshot publisher and the hook-thread
//! waker subscribe to it.

use chatter_core::{ClickSettings, SettingsListener, SettingsProvider};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

/// Current [`ClickSettings`] plus the listeners to notify on change.
pub struct SettingsStore {
    settings: RwLock<ClickSettings>,
    listeners: Mutex<Vec<SettingsListener>>,
}

impl SettingsStore {
    pub fn new(initial: ClickSettings) -> Self {
        Self {
            settings: RwLock::new(initial),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the settings and notifies listeners if anything differs.
    ///
    /// Returns `true` when listeners were notified. Listeners run on the
    /// calling thread after the store's locks are released, in subscription
    /// order.
    pub fn replace(&self, next: ClickSettings) -> bool {
        {
            let mut current = self.settings.write();
            if *current == next {
                return false;
            }
            *current = next;
        }
        debug!(?next, "settings changed");

        let listeners = self.listeners.lock().clone();
        for listener in listeners {
            listener();
        }
        true
    }

    /// Applies `change` to a copy of the current settings and stores it.
    pub fn update(&self, change: impl FnOnce(&mut ClickSettings)) -> bool {
        let mut next = self.current();
        change(&mut next);
        self.replace(next)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl SettingsProvider for SettingsStore {
    fn current(&self) -> ClickSettings {
        *self.settings.read()
    }

    fn subscribe(&self, listener: SettingsListener) {
        self.listeners.lock().push(listener);
    }
}
