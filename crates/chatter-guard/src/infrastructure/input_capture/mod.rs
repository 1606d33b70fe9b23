//! Mouse capture infrastructure.
//!
//! On Windows this installs a `WH_MOUSE_LL` hook on a dedicated Win32
//! message-loop thread. The same thread owns a hidden top-level window that
//! receives raw mouse input (to learn which device produced each event) and
//! power broadcasts (to release the hook across suspend).
//!
//! # Windows-Specific Implementation
//!
//! The hook callback must complete within the OS hook timeout or Windows
//! silently removes the hook. The verdict is computed inline by
//! [`crate::application::session::GuardSession::on_mouse`], which neither
//! blocks nor allocates.
//!
//! # Testability
//!
//! The [`CaptureService`] trait hides the thread from `main`, and
//! [`mock::RecordingBackend`] stands in for the OS hook in tests.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chatter_core::{SettingsListener, SnapshotCell};
use thiserror::Error;
use tracing::{error, warn};

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Error type for starting and driving the capture thread.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The hidden notification window could not be created.
    #[error("failed to create notification window: {0}")]
    WindowCreationFailed(String),

    /// The OS refused to start the hook thread.
    #[error("failed to spawn hook thread: {0}")]
    ThreadSpawnFailed(String),

    /// The hook thread terminated before reporting its startup result.
    #[error("hook thread exited during startup")]
    ThreadExited,

    /// A message could not be posted to the hook thread.
    #[error("failed to post message to hook thread: {0}")]
    PostFailed(String),

    /// Global mouse hooks are only implemented on Windows.
    #[error("global mouse hooks are not supported on {0}")]
    UnsupportedPlatform(String),
}

/// A running capture thread.
pub trait CaptureService: Send {
    /// Returns a settings listener that asks the capture thread to reconcile
    /// its hook with the latest published settings.
    fn waker(&self) -> SettingsListener;

    /// Stops the capture thread, releasing the hook, and waits for it.
    fn shutdown(self: Box<Self>);
}

/// Attempts to deliver the quit message before giving up on a worker.
const QUIT_POST_ATTEMPTS: u32 = 3;

/// How long a worker whose quit message never arrived may take to exit.
const DETACH_GRACE: Duration = Duration::from_millis(500);

/// Asks a message-loop worker to quit and joins it.
///
/// `post_quit` is retried a few times. If it never succeeds the worker is
/// joined only once it has already finished; otherwise it is detached and
/// the OS releases its hook when the process exits.
///
/// Returns `true` if the worker was joined.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) fn stop_worker<F>(mut post_quit: F, join: JoinHandle<()>) -> bool
where
    F: FnMut() -> Result<(), CaptureError>,
{
    let mut posted = false;
    for attempt in 1..=QUIT_POST_ATTEMPTS {
        match post_quit() {
            Ok(()) => {
                posted = true;
                break;
            }
            Err(e) => {
                warn!(attempt, "{e}");
                std::thread::sleep(Duration::from_millis(10));
            }
        }
    }

    if !posted {
        let deadline = Instant::now() + DETACH_GRACE;
        while !join.is_finished() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        if !join.is_finished() {
            error!("hook thread did not receive the quit message; detaching it");
            return false;
        }
    }

    if join.join().is_err() {
        error!("hook thread panicked");
    }
    true
}

/// The system double-click interval in milliseconds.
pub fn os_double_click_ms() -> u32 {
    #[cfg(target_os = "windows")]
    {
        self::windows::double_click_time()
    }

    #[cfg(not(target_os = "windows"))]
    {
        chatter_core::domain::thresholds::DEFAULT_DOUBLE_CLICK_MS
    }
}

/// Starts the platform capture thread reading settings from `snapshots`.
///
/// # Errors
///
/// Returns [`CaptureError::UnsupportedPlatform`] off Windows, or the startup
/// failure reported by the hook thread. A hook that Windows refuses to
/// install is not a startup failure.
pub fn start_capture(
    snapshots: Arc<SnapshotCell>,
) -> Result<Box<dyn CaptureService>, CaptureError> {
    #[cfg(target_os = "windows")]
    {
        let thread = self::windows::HookThread::spawn(snapshots)?;
        Ok(Box::new(thread))
    }

    #[cfg(not(target_os = "windows"))]
    {
        drop(snapshots);
        Err(CaptureError::UnsupportedPlatform(std::env::consts::OS.to_string()))
    }
}
