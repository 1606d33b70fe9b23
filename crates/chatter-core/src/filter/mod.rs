//! The interception hot path.
//!
//! - **`snapshot`** – The immutable threshold/observed-message snapshot and
//!   the cell it is published through. Configuration writers build a new
//!   snapshot and swap it in; the hook callback only ever reads.
//!
//! - **`device_tracker`** – Remembers which physical device produced the most
//!   recent input so events from an ignored device can be passed through.
//!
//! - **`classifier`** – Turns one low-level mouse message into a
//!   [`classifier::Verdict`]. Runs for every global mouse event, so it never
//!   blocks and never allocates.

pub mod classifier;
pub mod device_tracker;
pub mod snapshot;
