//! Infrastructure layer for Chatter Guard.
//!
//! Contains OS-facing adapters: the mouse hook thread and its notification
//! window, plus file-system storage for the TOML configuration and the live
//! settings store fed by it, and the process-wide logging setup.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `chatter_core`, but MUST NOT be imported by the `application` layer.

pub mod input_capture;
pub mod logging;
pub mod storage;
