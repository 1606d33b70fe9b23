//! Installed/Uninstalled state machine for the interception hook.
//!
//! ```text
//!              install() [use_hook]
//! Uninstalled ─────────────────────► Installed
//!      ▲                                 │
//!      └──── uninstall() [use_hook] ─────┤
//!      └──── suspend / dispose / drop ───┘
//! ```
//!
//! A suspended machine cannot service the hook, and Windows silently drops a
//! low-level hook that stops responding, so the hook is released on suspend
//! and installed again on resume.
//!
//! Every transition runs under one mutex, so the manager can be driven from
//! the hook thread, the settings thread and the shutdown path at once.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::filter::snapshot::SnapshotCell;

/// Error type for hook backend operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HookError {
    #[error("failed to install mouse hook: {0}")]
    InstallFailed(String),
    #[error("failed to uninstall mouse hook: {0}")]
    UninstallFailed(String),
}

/// Platform operations for registering the hook callback.
///
/// The production implementation wraps `WH_MOUSE_LL`; tests use a mock.
#[cfg_attr(test, mockall::automock)]
pub trait HookBackend {
    /// Registers the hook callback with the OS.
    fn install(&mut self) -> Result<(), HookError>;

    /// Deregisters the callback and releases the OS handle.
    ///
    /// Only called after a successful [`HookBackend::install`].
    fn uninstall(&mut self) -> Result<(), HookError>;
}

/// Current state of the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookState {
    Uninstalled,
    Installed,
}

/// A power-state transition relevant to the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEvent {
    Suspend,
    Resume,
}

struct Inner<B> {
    backend: B,
    state: HookState,
    /// Cleared by [`HookLifecycle::dispose`]; power events are ignored after.
    power_subscribed: bool,
}

/// Owns the hook backend and decides when it is installed.
pub struct HookLifecycle<B: HookBackend> {
    inner: Mutex<Inner<B>>,
    snapshots: Arc<SnapshotCell>,
}

impl<B: HookBackend> HookLifecycle<B> {
    /// Creates a manager in the Uninstalled state with power reactions
    /// enabled.
    pub fn new(backend: B, snapshots: Arc<SnapshotCell>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                backend,
                state: HookState::Uninstalled,
                power_subscribed: true,
            }),
            snapshots,
        }
    }

    pub fn state(&self) -> HookState {
        self.inner.lock().state
    }

    pub fn is_installed(&self) -> bool {
        self.state() == HookState::Installed
    }

    fn use_hook(&self) -> bool {
        self.snapshots.load().table.use_hook
    }

    /// Installs the hook unless it is disabled or already installed.
    ///
    /// Returns `true` if the hook is installed afterwards. A backend failure
    /// is logged and leaves the hook uninstalled.
    pub fn install(&self) -> bool {
        let mut inner = self.inner.lock();
        if !self.use_hook() || inner.state == HookState::Installed {
            return inner.state == HookState::Installed;
        }
        match inner.backend.install() {
            Ok(()) => {
                inner.state = HookState::Installed;
                info!("mouse hook installed");
                true
            }
            Err(e) => {
                warn!("{e}");
                false
            }
        }
    }

    /// Uninstalls the hook if it is installed and enabled.
    pub fn uninstall(&self) {
        if !self.use_hook() {
            return;
        }
        self.release("uninstall");
    }

    /// Uninstalls the hook if it is installed, regardless of `use_hook`.
    pub fn force_uninstall(&self) {
        self.release("forced uninstall");
    }

    fn release(&self, reason: &str) {
        let mut inner = self.inner.lock();
        if inner.state != HookState::Installed {
            return;
        }
        // The handle is gone either way; an OS error here cannot be retried.
        if let Err(e) = inner.backend.uninstall() {
            warn!("{e}");
        }
        inner.state = HookState::Uninstalled;
        info!(reason, "mouse hook uninstalled");
    }

    /// Reacts to a system power transition.
    pub fn on_power_event(&self, event: PowerEvent) {
        if !self.inner.lock().power_subscribed {
            debug!(?event, "power event after dispose ignored");
            return;
        }
        match event {
            PowerEvent::Suspend => {
                info!("system suspending; releasing mouse hook");
                self.force_uninstall();
            }
            PowerEvent::Resume => {
                info!("system resumed; reinstalling mouse hook");
                if !self.install() && self.use_hook() {
                    error!(
                        "mouse hook could not be reinstalled after resume; \
                         chatter filtering is inactive"
                    );
                }
            }
        }
    }

    /// Brings the hook in line with the current `use_hook` setting.
    ///
    /// Called after a settings change. Returns the resulting state.
    pub fn reconcile(&self) -> HookState {
        if !self.inner.lock().power_subscribed {
            return self.state();
        }
        if self.use_hook() {
            if !self.install() {
                warn!("mouse hook is enabled but could not be installed");
            }
        } else {
            self.force_uninstall();
        }
        self.state()
    }

    /// Stops power reactions and releases the hook. Idempotent.
    pub fn dispose(&self) {
        self.inner.lock().power_subscribed = false;
        self.force_uninstall();
    }
}

impl<B: HookBackend> Drop for HookLifecycle<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::thresholds::ThresholdTable;

    fn cell(use_hook: bool) -> Arc<SnapshotCell> {
        Arc::new(SnapshotCell::new(ThresholdTable {
            use_hook,
            ..ThresholdTable::default()
        }))
    }

    fn set_use_hook(cell: &SnapshotCell, use_hook: bool) {
        cell.publish(ThresholdTable {
            use_hook,
            ..ThresholdTable::default()
        });
    }

    /// Mock that accepts any number of installs and uninstalls.
    fn permissive_backend() -> MockHookBackend {
        let mut backend = MockHookBackend::new();
        backend.expect_install().returning(|| Ok(()));
        backend.expect_uninstall().returning(|| Ok(()));
        backend
    }

    // ── install / uninstall ───────────────────────────────────────────────────

    #[test]
    fn test_install_transitions_to_installed() {
        // Arrange
        let mut backend = MockHookBackend::new();
        backend.expect_install().times(1).returning(|| Ok(()));
        backend.expect_uninstall().times(1).returning(|| Ok(()));
        let lifecycle = HookLifecycle::new(backend, cell(true));

        // Act
        let installed = lifecycle.install();

        // Assert
        assert!(installed);
        assert_eq!(lifecycle.state(), HookState::Installed);
    }

    #[test]
    fn test_install_twice_calls_backend_once() {
        let mut backend = MockHookBackend::new();
        backend.expect_install().times(1).returning(|| Ok(()));
        backend.expect_uninstall().times(1).returning(|| Ok(()));
        let lifecycle = HookLifecycle::new(backend, cell(true));

        assert!(lifecycle.install());
        assert!(lifecycle.install());
    }

    #[test]
    fn test_install_is_noop_when_hook_disabled() {
        let mut backend = MockHookBackend::new();
        backend.expect_install().never();
        backend.expect_uninstall().never();
        let lifecycle = HookLifecycle::new(backend, cell(false));

        assert!(!lifecycle.install());
        assert_eq!(lifecycle.state(), HookState::Uninstalled);
    }

    #[test]
    fn test_install_failure_stays_uninstalled() {
        // Arrange
        let mut backend = MockHookBackend::new();
        backend
            .expect_install()
            .times(1)
            .returning(|| Err(HookError::InstallFailed("access denied".to_string())));
        backend.expect_uninstall().never();
        let lifecycle = HookLifecycle::new(backend, cell(true));

        // Act
        let installed = lifecycle.install();

        // Assert
        assert!(!installed);
        assert_eq!(lifecycle.state(), HookState::Uninstalled);
    }

    #[test]
    fn test_uninstall_twice_is_idempotent() {
        // Arrange
        let mut backend = MockHookBackend::new();
        backend.expect_install().times(1).returning(|| Ok(()));
        backend.expect_uninstall().times(1).returning(|| Ok(()));
        let lifecycle = HookLifecycle::new(backend, cell(true));
        lifecycle.install();

        // Act
        lifecycle.uninstall();
        lifecycle.uninstall();

        // Assert
        assert_eq!(lifecycle.state(), HookState::Uninstalled);
    }

    #[test]
    fn test_uninstall_is_noop_when_hook_disabled_but_force_releases() {
        // Arrange – installed while enabled, then the setting is switched off
        let snapshots = cell(true);
        let mut backend = MockHookBackend::new();
        backend.expect_install().times(1).returning(|| Ok(()));
        backend.expect_uninstall().times(1).returning(|| Ok(()));
        let lifecycle = HookLifecycle::new(backend, Arc::clone(&snapshots));
        lifecycle.install();
        set_use_hook(&snapshots, false);

        // Act / Assert
        lifecycle.uninstall();
        assert_eq!(lifecycle.state(), HookState::Installed);

        lifecycle.force_uninstall();
        assert_eq!(lifecycle.state(), HookState::Uninstalled);
    }

    #[test]
    fn test_uninstall_error_still_releases_state() {
        let mut backend = MockHookBackend::new();
        backend.expect_install().times(1).returning(|| Ok(()));
        backend
            .expect_uninstall()
            .times(1)
            .returning(|| Err(HookError::UninstallFailed("invalid handle".to_string())));
        let lifecycle = HookLifecycle::new(backend, cell(true));
        lifecycle.install();

        lifecycle.uninstall();

        assert_eq!(lifecycle.state(), HookState::Uninstalled);
    }

    // ── Power transitions ─────────────────────────────────────────────────────

    #[test]
    fn test_suspend_then_resume_reinstalls() {
        // Arrange
        let mut backend = MockHookBackend::new();
        backend.expect_install().times(2).returning(|| Ok(()));
        backend.expect_uninstall().times(2).returning(|| Ok(()));
        let lifecycle = HookLifecycle::new(backend, cell(true));
        lifecycle.install();

        // Act / Assert
        lifecycle.on_power_event(PowerEvent::Suspend);
        assert_eq!(lifecycle.state(), HookState::Uninstalled);

        lifecycle.on_power_event(PowerEvent::Resume);
        assert_eq!(lifecycle.state(), HookState::Installed);
    }

    #[test]
    fn test_repeated_resume_notifications_install_once() {
        // Windows sends both "resume automatic" and "resume suspend".
        let mut backend = MockHookBackend::new();
        backend.expect_install().times(1).returning(|| Ok(()));
        backend.expect_uninstall().times(1).returning(|| Ok(()));
        let lifecycle = HookLifecycle::new(backend, cell(true));

        lifecycle.on_power_event(PowerEvent::Resume);
        lifecycle.on_power_event(PowerEvent::Resume);

        assert!(lifecycle.is_installed());
    }

    #[test]
    fn test_resume_failure_leaves_hook_uninstalled_without_panic() {
        let mut backend = MockHookBackend::new();
        backend
            .expect_install()
            .returning(|| Err(HookError::InstallFailed("desktop locked".to_string())));
        backend.expect_uninstall().never();
        let lifecycle = HookLifecycle::new(backend, cell(true));

        lifecycle.on_power_event(PowerEvent::Resume);

        assert_eq!(lifecycle.state(), HookState::Uninstalled);
    }

    #[test]
    fn test_suspend_releases_even_when_hook_disabled() {
        let snapshots = cell(true);
        let lifecycle = HookLifecycle::new(permissive_backend(), Arc::clone(&snapshots));
        lifecycle.install();
        set_use_hook(&snapshots, false);

        lifecycle.on_power_event(PowerEvent::Suspend);

        assert_eq!(lifecycle.state(), HookState::Uninstalled);
    }

    // ── Reconcile / dispose ───────────────────────────────────────────────────

    #[test]
    fn test_reconcile_follows_use_hook_setting() {
        // Arrange
        let snapshots = cell(false);
        let lifecycle = HookLifecycle::new(permissive_backend(), Arc::clone(&snapshots));

        // Act / Assert
        assert_eq!(lifecycle.reconcile(), HookState::Uninstalled);

        set_use_hook(&snapshots, true);
        assert_eq!(lifecycle.reconcile(), HookState::Installed);

        set_use_hook(&snapshots, false);
        assert_eq!(lifecycle.reconcile(), HookState::Uninstalled);
    }

    #[test]
    fn test_dispose_releases_and_ignores_later_power_events() {
        // Arrange
        let mut backend = MockHookBackend::new();
        backend.expect_install().times(1).returning(|| Ok(()));
        backend.expect_uninstall().times(1).returning(|| Ok(()));
        let lifecycle = HookLifecycle::new(backend, cell(true));
        lifecycle.install();

        // Act
        lifecycle.dispose();
        lifecycle.dispose();
        lifecycle.on_power_event(PowerEvent::Resume);

        // Assert
        assert_eq!(lifecycle.state(), HookState::Uninstalled);
    }

    #[test]
    fn test_drop_releases_installed_hook() {
        let mut backend = MockHookBackend::new();
        backend.expect_install().times(1).returning(|| Ok(()));
        backend.expect_uninstall().times(1).returning(|| Ok(()));
        let lifecycle = HookLifecycle::new(backend, cell(true));
        lifecycle.install();

        // The uninstall expectation is verified when the mock is dropped.
        drop(lifecycle);
    }

    #[test]
    fn test_lifecycle_is_shareable_across_threads() {
        let lifecycle = Arc::new(HookLifecycle::new(permissive_backend(), cell(true)));
        lifecycle.install();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lc = Arc::clone(&lifecycle);
                std::thread::spawn(move || lc.uninstall())
            })
            .collect();
        for h in handles {
            h.join().expect("thread panicked");
        }

        assert_eq!(lifecycle.state(), HookState::Uninstalled);
    }
}
