//! Config file hot reload.
//!
//! The watcher polls the config file's modification time on a tokio
//! interval. When it changes, the file is parsed and validated and the
//! resulting [`ClickSettings`](chatter_core::ClickSettings) replace those in
//! the [`SettingsStore`]. A broken edit keeps the previous settings.
//!
//! File access goes through `tokio::fs` so a slow disk never stalls a runtime
//! worker.
//!
//! `general.log_level` is read once at startup and is not reloaded.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use super::config::load_config_async;
use super::settings_store::SettingsStore;

/// Result of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The file's modification time is unchanged.
    Unchanged,
    /// The file changed and new settings were applied.
    Applied,
    /// The file changed but the settings it describes did not.
    NoEffect,
    /// The file changed but could not be loaded; previous settings kept.
    Rejected,
}

/// Polls one config file and feeds a [`SettingsStore`].
pub struct ConfigWatcher {
    path: PathBuf,
    store: Arc<SettingsStore>,
    interval: Duration,
    last_modified: Option<SystemTime>,
}

impl ConfigWatcher {
    /// Creates a watcher treating the file's current state as already loaded.
    pub async fn new(path: PathBuf, store: Arc<SettingsStore>, interval: Duration) -> Self {
        let last_modified = modified(&path).await;
        Self {
            path,
            store,
            interval,
            last_modified,
        }
    }

    /// Checks the file once and reloads it if it changed.
    pub async fn poll_once(&mut self) -> ReloadOutcome {
        let current = modified(&self.path).await;
        if current == self.last_modified {
            return ReloadOutcome::Unchanged;
        }
        self.last_modified = current;

        match load_config_async(&self.path).await {
            Ok(cfg) => {
                cfg.log_warnings();
                if self.store.replace(cfg.click_settings()) {
                    info!(path = %self.path.display(), "configuration reloaded");
                    ReloadOutcome::Applied
                } else {
                    debug!(path = %self.path.display(), "configuration touched without changes");
                    ReloadOutcome::NoEffect
                }
            }
            Err(e) => {
                warn!("keeping previous settings: {e}");
                ReloadOutcome::Rejected
            }
        }
    }

    /// Polls forever at the configured interval.
    ///
    /// Intended for `tokio::spawn`; stop it by aborting the task.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(
            path = %self.path.display(),
            interval_ms = self.interval.as_millis() as u64,
            "watching configuration file"
        );
        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }
}

/// Modification time, or `None` if the file is absent or unreadable.
async fn modified(path: &std::path::Path) -> Option<SystemTime> {
    tokio::fs::metadata(path)
        .await
        .and_then(|m| m.modified())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatter_core::{ClickSettings, SettingsProvider};
    use uuid::Uuid;

    fn temp_config_path() -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("chatter_guard_watch_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        (dir, path)
    }

    fn store() -> Arc<SettingsStore> {
        Arc::new(SettingsStore::new(ClickSettings::default()))
    }

    #[tokio::test]
    async fn test_poll_without_file_is_unchanged() {
        let (dir, path) = temp_config_path();
        let mut watcher = ConfigWatcher::new(path, store(), Duration::from_millis(10)).await;

        assert_eq!(watcher.poll_once().await, ReloadOutcome::Unchanged);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_new_file_is_applied() {
        // Arrange
        let (dir, path) = temp_config_path();
        let store = store();
        let mut watcher =
            ConfigWatcher::new(path.clone(), Arc::clone(&store), Duration::from_millis(10)).await;

        // Act
        std::fs::write(&path, "[thresholds]\nleft = 90\n").unwrap();
        let outcome = watcher.poll_once().await;

        // Assert
        assert_eq!(outcome, ReloadOutcome::Applied);
        assert_eq!(store.current().left_threshold, 90);
        assert_eq!(watcher.poll_once().await, ReloadOutcome::Unchanged);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_file_with_default_values_has_no_effect() {
        let (dir, path) = temp_config_path();
        let store = store();
        let mut watcher =
            ConfigWatcher::new(path.clone(), Arc::clone(&store), Duration::from_millis(10)).await;

        std::fs::write(&path, "[general]\nlog_level = \"debug\"\n").unwrap();

        assert_eq!(watcher.poll_once().await, ReloadOutcome::NoEffect);
        assert_eq!(store.current(), ClickSettings::default());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_broken_file_keeps_previous_settings() {
        // Arrange
        let (dir, path) = temp_config_path();
        let store = store();
        store.update(|s| s.right_threshold = 33);
        let mut watcher =
            ConfigWatcher::new(path.clone(), Arc::clone(&store), Duration::from_millis(10)).await;

        // Act
        std::fs::write(&path, "[thresholds]\nright = 99999\n").unwrap();
        let outcome = watcher.poll_once().await;

        // Assert
        assert_eq!(outcome, ReloadOutcome::Rejected);
        assert_eq!(store.current().right_threshold, 33);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_run_picks_up_edit() {
        // Arrange
        let (dir, path) = temp_config_path();
        let store = store();
        let watcher =
            ConfigWatcher::new(path.clone(), Arc::clone(&store), Duration::from_millis(10)).await;
        let task = tokio::spawn(watcher.run());

        // Act
        // Written aside and renamed so no poll sees a half-written file.
        let staged = dir.join("config.toml.staged");
        tokio::fs::write(&staged, "[hook]\nenabled = false\n").await.unwrap();
        tokio::fs::rename(&staged, &path).await.unwrap();

        // Assert
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while store.current().use_hook && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!store.current().use_hook);

        task.abort();
        std::fs::remove_dir_all(&dir).ok();
    }
}
