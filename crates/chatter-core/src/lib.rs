//! # chatter-core
//!
//! Shared library for Chatter Guard containing the chatter suppression rules,
//! the per-button timing state, device tracking and the hook lifecycle state
//! machine.
//!
//! This crate has zero dependencies on OS APIs. Everything platform specific
//! (installing the global mouse hook, reading raw input payloads, receiving
//! power notifications) sits behind the [`HookBackend`] and
//! [`DeviceResolver`] traits and is implemented by the `chatter-guard` binary.
//!
//! # What is chatter? (for beginners)
//!
//! A worn mechanical mouse switch "bounces": a single physical click produces
//! press, release, press, release within a few milliseconds. Applications see
//! an unintended double-click. Chatter Guard watches every button transition
//! system-wide and swallows a press that arrives implausibly soon after the
//! previous release of the same button.
//!
//! - **`domain`** – Buttons, message kinds, thresholds and device identities.
//!   Plain data with no behaviour beyond derivation rules.
//!
//! - **`filter`** – The hot path: the published settings snapshot, the device
//!   tracker and the classifier that returns a pass/suppress verdict.
//!
//! - **`hook`** – The Installed/Uninstalled state machine for the global
//!   interception handle, including suspend/resume handling.
//!
//! - **`settings`** – The configuration contract consumed by the core.

pub mod domain;
pub mod filter;
pub mod hook;
pub mod settings;

pub use domain::button::{Button, ButtonMap};
pub use domain::device::DeviceId;
pub use domain::message::{Direction, MessageKind, ObservedMessages};
pub use domain::thresholds::ThresholdTable;
pub use filter::classifier::{ChatterFilter, MouseHookEvent, Verdict};
pub use filter::device_tracker::{DeviceResolver, DeviceTracker, ResolveError};
pub use filter::snapshot::{FilterSnapshot, SnapshotCell, SnapshotPublisher};
pub use hook::lifecycle::{HookBackend, HookError, HookLifecycle, HookState, PowerEvent};
pub use settings::{ClickSettings, SettingsListener, SettingsProvider};
