//! Lifecycle of the global interception hook.
//!
//! The OS-specific part (calling `SetWindowsHookExW` / `UnhookWindowsHookEx`)
//! is a [`lifecycle::HookBackend`]; the rules for when to install and
//! uninstall, including suspend/resume, live in [`lifecycle::HookLifecycle`]
//! so they can be tested without a real hook.

pub mod lifecycle;
