//! Domain entities for Chatter Guard.
//!
//! Pure data types with no infrastructure dependencies. They can be compiled
//! and tested on any platform; the Windows-specific message numbers in
//! [`message`] are plain constants, not API imports.

/// Mouse buttons and the dense per-button storage.
pub mod button;

/// Opaque physical device identity reported by raw input.
pub mod device;

/// Button-transition message kinds and the observed-message set.
pub mod message;

/// Per-button thresholds and global knobs.
pub mod thresholds;
