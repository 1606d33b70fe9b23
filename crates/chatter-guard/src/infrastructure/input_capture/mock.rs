//! Recording hook backend for tests.
//!
//! Stands in for the Windows hook so the session and lifecycle can be driven
//! end to end without a message loop. Clones share one log, so a test can
//! keep a handle after moving the backend into a session.

use std::sync::Arc;

use chatter_core::{HookBackend, HookError};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct BackendLog {
    installs: u32,
    uninstalls: u32,
    fail_install: bool,
}

/// A [`HookBackend`] that counts calls and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    log: Arc<Mutex<BackendLog>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful installs so far.
    pub fn install_count(&self) -> u32 {
        self.log.lock().installs
    }

    pub fn uninstall_count(&self) -> u32 {
        self.log.lock().uninstalls
    }

    /// `true` while more installs than uninstalls have been recorded.
    pub fn is_active(&self) -> bool {
        let log = self.log.lock();
        log.installs > log.uninstalls
    }

    /// Makes subsequent installs fail until reset.
    pub fn set_fail_install(&self, fail: bool) {
        self.log.lock().fail_install = fail;
    }
}

impl HookBackend for RecordingBackend {
    fn install(&mut self) -> Result<(), HookError> {
        let mut log = self.log.lock();
        if log.fail_install {
            return Err(HookError::InstallFailed("simulated install failure".to_string()));
        }
        log.installs += 1;
        Ok(())
    }

    fn uninstall(&mut self) -> Result<(), HookError> {
        self.log.lock().uninstalls += 1;
        Ok(())
    }
}
