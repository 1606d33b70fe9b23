//! The running suppression session.
//!
//! A [`GuardSession`] is owned by the thread that services the mouse hook.
//! That thread calls [`GuardSession::on_mouse`] from the hook callback and the
//! other `on_*` methods from its window procedure and message loop, so the
//! session never needs to be shared.
//!
//! ```text
//! hook callback ──► on_mouse ──► ChatterFilter::evaluate ──► Verdict
//! WM_INPUT ───────► on_raw_input ──► DeviceTracker
//! WM_POWERBROADCAST ──► on_power ──► HookLifecycle
//! settings waker ───► on_settings_changed ──► HookLifecycle::reconcile
//! ```

use std::sync::Arc;

use chatter_core::{
    ChatterFilter, DeviceResolver, HookBackend, HookLifecycle, HookState, MouseHookEvent,
    PowerEvent, SnapshotCell, Verdict,
};
use tracing::{error, info};

/// Filter and hook lifecycle bound to one snapshot cell.
pub struct GuardSession<B: HookBackend> {
    filter: ChatterFilter,
    lifecycle: HookLifecycle<B>,
    snapshots: Arc<SnapshotCell>,
}

impl<B: HookBackend> GuardSession<B> {
    /// Creates a session with the hook uninstalled.
    pub fn new(backend: B, snapshots: Arc<SnapshotCell>) -> Self {
        Self {
            filter: ChatterFilter::new(Arc::clone(&snapshots)),
            lifecycle: HookLifecycle::new(backend, Arc::clone(&snapshots)),
            snapshots,
        }
    }

    /// Installs the hook if the settings enable it.
    ///
    /// Returns `true` when the hook is installed afterwards. A failed install
    /// is not fatal: the session stays usable and the next resume or
    /// settings change tries again.
    pub fn start(&self) -> bool {
        let installed = self.lifecycle.install();
        if installed {
            info!("chatter filtering active");
        } else if self.hook_enabled() {
            error!(
                "mouse hook could not be installed at startup; \
                 retrying on resume or settings change"
            );
        } else {
            info!("chatter filtering disabled in settings; hook not installed");
        }
        installed
    }

    /// Classifies one hook event.
    #[inline]
    pub fn on_mouse(&mut self, stage: i32, event: &MouseHookEvent) -> Verdict {
        self.filter.evaluate(stage, event)
    }

    /// Records the device behind a raw input notification.
    pub fn on_raw_input<R: DeviceResolver>(
        &mut self,
        resolver: &R,
        notification: R::Notification,
    ) -> bool {
        self.filter.on_raw_input(resolver, notification)
    }

    pub fn on_power(&self, event: PowerEvent) {
        self.lifecycle.on_power_event(event);
    }

    /// Aligns the hook with freshly published settings.
    pub fn on_settings_changed(&self) -> HookState {
        self.lifecycle.reconcile()
    }

    pub fn hook_state(&self) -> HookState {
        self.lifecycle.state()
    }

    pub fn hook_enabled(&self) -> bool {
        self.snapshots.load().table.use_hook
    }

    pub fn filter(&self) -> &ChatterFilter {
        &self.filter
    }

    /// Releases the hook and stops reacting to power events.
    pub fn shutdown(&self) {
        self.lifecycle.dispose();
        info!(
            suppressed = self.filter.suppressed_count(),
            "chatter session stopped"
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
