//! TOML-based configuration persistence.
//!
//! Reads and writes [`AppConfig`] to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\ChatterGuard\config.toml`
//! - Linux:    `~/.config/chatterguard/config.toml`
//! - macOS:    `~/Library/Application Support/ChatterGuard/config.toml`
//!
//! # File layout
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [hook]
//! enabled = true
//! # ignored_device = 65603
//!
//! [thresholds]
//! left = 50
//! right = 50
//! middle = 50
//! x1 = -1
//! x2 = -1
//! min_delay = -1
//! ```
//!
//! All durations are milliseconds. A negative threshold turns filtering off
//! for that button; a negative `min_delay` turns the fast-click carve-out off.
//!
//! # Serde default values
//!
//! Every section and field falls back to its default when absent, so a
//! missing file, an empty file and an old file all load cleanly.

use std::path::{Path, PathBuf};

use chatter_core::{ClickSettings, DeviceId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Largest accepted threshold or minimum delay.
pub const MAX_INTERVAL_MS: i32 = 10_000;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is outside its accepted range.
    #[error("invalid value {value} for {field}: must be at most {max} ms", max = MAX_INTERVAL_MS)]
    Invalid { field: &'static str, value: i32 },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub hook: HookConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Master switch and device exclusion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HookConfig {
    /// Whether the global mouse hook is installed at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Raw input device handle whose clicks are never filtered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored_device: Option<DeviceId>,
}

/// Per-button suppression windows in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdConfig {
    #[serde(default = "default_primary_threshold")]
    pub left: i32,
    #[serde(default = "default_primary_threshold")]
    pub right: i32,
    #[serde(default = "default_primary_threshold")]
    pub middle: i32,
    #[serde(default = "default_disabled")]
    pub x1: i32,
    #[serde(default = "default_disabled")]
    pub x2: i32,
    #[serde(default = "default_disabled")]
    pub min_delay: i32,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_primary_threshold() -> i32 {
    50
}
fn default_disabled() -> i32 {
    -1
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            ignored_device: None,
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            left: default_primary_threshold(),
            right: default_primary_threshold(),
            middle: default_primary_threshold(),
            x1: default_disabled(),
            x2: default_disabled(),
            min_delay: default_disabled(),
        }
    }
}

impl AppConfig {
    /// The settings the core consumes.
    pub fn click_settings(&self) -> ClickSettings {
        ClickSettings {
            use_hook: self.hook.enabled,
            left_threshold: self.thresholds.left,
            right_threshold: self.thresholds.right,
            middle_threshold: self.thresholds.middle,
            x1_threshold: self.thresholds.x1,
            x2_threshold: self.thresholds.x2,
            min_delay: self.thresholds.min_delay,
            ignored_device: self.hook.ignored_device,
        }
    }

    /// Checks value ranges.
    ///
    /// Logs nothing; see [`AppConfig::warnings`] for legal but suspicious
    /// values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for any interval above
    /// [`MAX_INTERVAL_MS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in self.interval_fields() {
            if value > MAX_INTERVAL_MS {
                return Err(ConfigError::Invalid { field, value });
            }
        }
        Ok(())
    }

    /// Buttons whose enabled threshold is covered by `min_delay`.
    ///
    /// Such a button can never be filtered. The configuration is still
    /// accepted.
    pub fn warnings(&self) -> Vec<ConfigWarning> {
        let min_delay = self.thresholds.min_delay;
        if min_delay < 0 {
            return Vec::new();
        }
        self.interval_fields()[..5]
            .iter()
            .filter(|&&(_, threshold)| threshold >= 0 && min_delay >= threshold)
            .map(|&(field, threshold_ms)| ConfigWarning::MinDelayCoversThreshold {
                field,
                threshold_ms,
                min_delay_ms: min_delay,
            })
            .collect()
    }

    /// Emits every [`ConfigWarning`] through `tracing`.
    ///
    /// Call once logging is initialised.
    pub fn log_warnings(&self) {
        for warning in self.warnings() {
            match warning {
                ConfigWarning::MinDelayCoversThreshold {
                    field,
                    threshold_ms,
                    min_delay_ms,
                } => warn!(
                    field,
                    threshold_ms,
                    min_delay_ms,
                    "min_delay covers the whole threshold; this button is never filtered"
                ),
            }
        }
    }

    /// The five thresholds followed by `min_delay`.
    fn interval_fields(&self) -> [(&'static str, i32); 6] {
        let t = &self.thresholds;
        [
            ("thresholds.left", t.left),
            ("thresholds.right", t.right),
            ("thresholds.middle", t.middle),
            ("thresholds.x1", t.x1),
            ("thresholds.x2", t.x2),
            ("thresholds.min_delay", t.min_delay),
        ]
    }
}

/// A legal configuration value that defeats its own purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    MinDelayCoversThreshold {
        field: &'static str,
        threshold_ms: i32,
        min_delay_ms: i32,
    },
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Parses and validates configuration text.
///
/// Warnings are not logged here; the caller decides when logging is ready
/// and calls [`AppConfig::log_warnings`].
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed TOML and
/// [`ConfigError::Invalid`] for out-of-range values.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let cfg: AppConfig = toml::from_str(content)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed and
/// [`ConfigError::Invalid`] for out-of-range values.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Async variant of [`load_config_from`] for callers on the tokio runtime.
///
/// # Errors
///
/// Same as [`load_config_from`].
pub async fn load_config_async(path: &Path) -> Result<AppConfig, ConfigError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("ChatterGuard"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("chatterguard"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("ChatterGuard")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io::Write;
    use std::sync::Arc;
    use uuid::Uuid;

    /// `io::Write` into a shared buffer, for capturing formatted log output.
    struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("chatter_guard_test_{}", Uuid::new_v4()))
    }

    // ── AppConfig defaults ────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_matches_click_settings_default() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.click_settings(), ClickSettings::default());
    }

    #[test]
    fn test_general_config_default_log_level_is_info() {
        assert_eq!(GeneralConfig::default().log_level, "info");
    }

    #[test]
    fn test_side_buttons_and_min_delay_disabled_by_default() {
        let t = ThresholdConfig::default();
        assert_eq!((t.x1, t.x2, t.min_delay), (-1, -1, -1));
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg = parse_config("").expect("empty config parses");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_thresholds_override_defaults() {
        // Arrange
        let toml_str = r#"
[thresholds]
left = 80
x1 = 30
"#;

        // Act
        let cfg = parse_config(toml_str).expect("partial config parses");

        // Assert
        assert_eq!(cfg.thresholds.left, 80);
        assert_eq!(cfg.thresholds.x1, 30);
        // Unspecified fields keep their defaults
        assert_eq!(cfg.thresholds.right, 50);
        assert_eq!(cfg.thresholds.x2, -1);
        assert!(cfg.hook.enabled);
    }

    #[test]
    fn test_click_settings_carry_hook_section() {
        let cfg = parse_config(
            r#"
[hook]
enabled = false
ignored_device = 65603
"#,
        )
        .unwrap();

        let settings = cfg.click_settings();

        assert!(!settings.use_hook);
        assert_eq!(settings.ignored_device, Some(DeviceId(65603)));
    }

    #[test]
    fn test_absent_ignored_device_is_omitted_from_output() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        assert!(!toml_str.contains("ignored_device"));
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let result = parse_config("[[[ not valid toml");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn test_threshold_above_limit_is_rejected() {
        // Arrange
        let toml_str = "[thresholds]\nmiddle = 10001\n";

        // Act
        let result = parse_config(toml_str);

        // Assert
        match result {
            Err(ConfigError::Invalid { field, value }) => {
                assert_eq!(field, "thresholds.middle");
                assert_eq!(value, 10_001);
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_threshold_at_limit_is_accepted() {
        assert!(parse_config("[thresholds]\nleft = 10000\n").is_ok());
    }

    #[test]
    fn test_min_delay_covering_threshold_is_accepted_with_warning() {
        // Arrange / Act
        let cfg = parse_config("[thresholds]\nleft = 20\nmin_delay = 20\n").unwrap();

        // Assert – only left is covered; right and middle keep 50
        assert_eq!(cfg.thresholds.min_delay, 20);
        assert_eq!(
            cfg.warnings(),
            vec![ConfigWarning::MinDelayCoversThreshold {
                field: "thresholds.left",
                threshold_ms: 20,
                min_delay_ms: 20,
            }]
        );
    }

    #[test]
    fn test_disabled_thresholds_and_min_delay_produce_no_warnings() {
        let cfg = parse_config("[thresholds]\nx1 = -1\nmin_delay = 49\n").unwrap();
        assert!(cfg.warnings().is_empty());
        assert!(AppConfig::default().warnings().is_empty());
    }

    #[test]
    fn test_log_warnings_emits_through_installed_subscriber() {
        // Arrange
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let writer_buffer = Arc::clone(&buffer);
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || CapturedWriter(Arc::clone(&writer_buffer)))
            .with_ansi(false)
            .finish();
        let cfg = parse_config("[thresholds]\nmiddle = 8\nmin_delay = 10\n").unwrap();

        // Act
        tracing::subscriber::with_default(subscriber, || cfg.log_warnings());

        // Assert
        let output = String::from_utf8(buffer.lock().clone()).unwrap();
        assert!(output.contains("WARN"), "got: {output}");
        assert!(output.contains("min_delay covers the whole threshold"), "got: {output}");
        assert!(output.contains("thresholds.middle"), "got: {output}");
    }

    #[test]
    fn test_invalid_message_names_the_limit() {
        let err = ConfigError::Invalid {
            field: "thresholds.left",
            value: 20_000,
        };
        assert!(err.to_string().contains(&MAX_INTERVAL_MS.to_string()));
    }

    // ── load / save on disk ───────────────────────────────────────────────────

    #[test]
    fn test_load_config_from_missing_file_returns_default() {
        let path = temp_dir().join("config.toml");
        let cfg = load_config_from(&path).expect("missing file is not an error");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_save_and_load_config_round_trip_via_temp_dir() {
        // Arrange
        let dir = temp_dir();
        let path = dir.join("nested").join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.thresholds.left = 35;
        cfg.hook.ignored_device = Some(DeviceId(0x1_0045));
        cfg.general.log_level = "debug".to_string();

        // Act
        save_config_to(&path, &cfg).expect("save");
        let loaded = load_config_from(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    // ── config_dir path formation ─────────────────────────────────────────────

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(
                path.ends_with("config.toml"),
                "config file must be named config.toml, got {path:?}"
            );
        }
        // NoPlatformConfigDir in a stripped CI environment is also acceptable.
    }

    #[tokio::test]
    async fn test_load_config_async_matches_sync_loader() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("chatter_guard_async_{}", Uuid::new_v4()));
        let path = dir.join("config.toml");
        let missing = load_config_async(&path).await.unwrap();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "[thresholds]\nright = 75\n").unwrap();

        // Act
        let loaded = load_config_async(&path).await.unwrap();

        // Assert
        assert_eq!(missing, AppConfig::default());
        assert_eq!(loaded, load_config_from(&path).unwrap());
        assert_eq!(loaded.thresholds.right, 75);

        std::fs::remove_dir_all(&dir).ok();
    }
}
