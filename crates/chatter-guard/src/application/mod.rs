//! Application layer for Chatter Guard.
//!
//! # What lives here? (for beginners)
//!
//! The application layer glues the pure rules from `chatter_core` into one
//! object the OS adapter can drive. It contains no OS calls and no file
//! access, so everything here runs in ordinary unit tests.
//!
//! - **`session`** – [`session::GuardSession`]: the filter plus the hook
//!   lifecycle, with one entry point per kind of OS notification (mouse
//!   event, raw input, power broadcast, settings change).

pub mod session;
