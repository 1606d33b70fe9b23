//! Windows low-level mouse hook, raw input and power notifications.
//!
//! One dedicated thread owns everything:
//!
//! - the `WH_MOUSE_LL` hook, whose callback runs on this thread while it
//!   pumps messages,
//! - a hidden top-level window registered for raw mouse input
//!   (`RIDEV_INPUTSINK`) and receiving `WM_POWERBROADCAST`,
//! - the [`GuardSession`], kept in a thread-local so the callbacks can reach
//!   it without locking.
//!
//! Message-only windows do not receive broadcasts, so the window is a real
//! top-level window that is simply never shown.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::cell::RefCell;
use std::ffi::c_void;
use std::mem::size_of;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chatter_core::{
    DeviceId, DeviceResolver, HookBackend, HookError, MouseHookEvent, PowerEvent, ResolveError,
    SettingsListener, SnapshotCell, Verdict,
};
use tracing::{debug, error, info, warn};
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::GetDoubleClickTime;
use windows::Win32::UI::Input::{
    GetRawInputData, RegisterRawInputDevices, HRAWINPUT, RAWINPUTDEVICE, RAWINPUTHEADER,
    RIDEV_INPUTSINK, RID_HEADER,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
    PostThreadMessageW, RegisterClassW, SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx,
    UnregisterClassW, HC_ACTION, HHOOK, MSG, MSLLHOOKSTRUCT, WH_MOUSE_LL, WINDOW_EX_STYLE, WM_APP,
    WM_INPUT, WM_POWERBROADCAST, WM_QUIT, WNDCLASSW, WS_OVERLAPPED,
};

use super::{stop_worker, CaptureError, CaptureService};
use crate::application::session::GuardSession;

// Power broadcast event codes carried in the WPARAM of WM_POWERBROADCAST.
const PBT_APMSUSPEND: u32 = 0x0004;
const PBT_APMRESUMESUSPEND: u32 = 0x0007;
const PBT_APMRESUMEAUTOMATIC: u32 = 0x0012;

/// Thread message asking the hook thread to reconcile after a settings change.
const WM_RECONCILE: u32 = WM_APP + 1;

/// HID usage page / usage for a generic desktop mouse.
const HID_USAGE_PAGE_GENERIC: u16 = 0x01;
const HID_USAGE_GENERIC_MOUSE: u16 = 0x02;

const WINDOW_CLASS: PCWSTR = w!("ChatterGuardNotifyWindow");

thread_local! {
    static SESSION: RefCell<Option<GuardSession<WindowsMouseHook>>> = const { RefCell::new(None) };
}

/// Runs `f` against this thread's session.
///
/// Returns `None` when no session is installed or the session is already
/// borrowed further up the stack.
fn with_session<R>(f: impl FnOnce(&mut GuardSession<WindowsMouseHook>) -> R) -> Option<R> {
    SESSION.with(|cell| {
        let mut slot = cell.try_borrow_mut().ok()?;
        slot.as_mut().map(f)
    })
}

/// The system double-click interval in milliseconds.
pub fn double_click_time() -> u32 {
    // SAFETY: GetDoubleClickTime has no preconditions.
    unsafe { GetDoubleClickTime() }
}

// ── Hook backend ──────────────────────────────────────────────────────────────

/// [`HookBackend`] over `SetWindowsHookExW(WH_MOUSE_LL)`.
///
/// Must be driven from the thread that pumps messages for the hook.
#[derive(Debug, Default)]
pub struct WindowsMouseHook {
    handle: Option<HHOOK>,
}

impl HookBackend for WindowsMouseHook {
    fn install(&mut self) -> Result<(), HookError> {
        // SAFETY: a null module name returns the handle of the running executable.
        let module = unsafe { GetModuleHandleW(PCWSTR::null()) }
            .map_err(|e| HookError::InstallFailed(e.to_string()))?;
        // SAFETY: mouse_hook_proc matches HOOKPROC and this thread runs a
        // message loop for as long as the hook is installed.
        let handle = unsafe {
            SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), Some(HINSTANCE(module.0)), 0)
        }
        .map_err(|e| HookError::InstallFailed(e.to_string()))?;
        self.handle = Some(handle);
        Ok(())
    }

    fn uninstall(&mut self) -> Result<(), HookError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        // SAFETY: handle came from SetWindowsHookExW and is released once.
        unsafe { UnhookWindowsHookEx(handle) }
            .map_err(|e| HookError::UninstallFailed(e.to_string()))
    }
}

/// Low-level mouse hook callback.
///
/// # Safety
///
/// Called by Windows from the hook thread; must return quickly.
unsafe extern "system" fn mouse_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code == HC_ACTION as i32 {
        // SAFETY: l_param points to a MSLLHOOKSTRUCT when n_code == HC_ACTION.
        let info = &*(l_param.0 as *const MSLLHOOKSTRUCT);
        let event = MouseHookEvent::new(w_param.0 as u32, info.mouseData, info.time);
        let verdict =
            with_session(|session| session.on_mouse(n_code, &event)).unwrap_or(Verdict::Pass);
        if verdict.is_suppress() {
            return LRESULT(1);
        }
    }

    // SAFETY: Forward the event to the next hook in the chain.
    CallNextHookEx(None, n_code, w_param, l_param)
}

// ── Raw input ─────────────────────────────────────────────────────────────────

/// Reads the device handle from a `WM_INPUT` header.
pub struct RawInputHeaderResolver;

impl DeviceResolver for RawInputHeaderResolver {
    type Notification = HRAWINPUT;

    fn resolve(&self, handle: HRAWINPUT) -> Result<DeviceId, ResolveError> {
        let expected = size_of::<RAWINPUTHEADER>() as u32;
        let mut header = RAWINPUTHEADER::default();
        let mut size = expected;
        // SAFETY: header is a writable RAWINPUTHEADER of `size` bytes and
        // handle comes straight from the WM_INPUT LPARAM.
        let copied = unsafe {
            GetRawInputData(
                handle,
                RID_HEADER,
                Some(&mut header as *mut RAWINPUTHEADER as *mut c_void),
                &mut size,
                expected,
            )
        };
        if copied != expected {
            return Err(ResolveError::SizeMismatch {
                expected,
                actual: copied,
            });
        }
        if header.hDevice.is_invalid() {
            return Err(ResolveError::NoDevice);
        }
        Ok(DeviceId(header.hDevice.0 as isize))
    }
}

// ── Notification window ───────────────────────────────────────────────────────

/// Hidden top-level window receiving raw input and power broadcasts.
struct NotifyWindow {
    hwnd: HWND,
    instance: HINSTANCE,
}

impl NotifyWindow {
    fn create() -> Result<Self, CaptureError> {
        // SAFETY: a null module name returns the handle of the running executable.
        let module = unsafe { GetModuleHandleW(PCWSTR::null()) }
            .map_err(|e| CaptureError::WindowCreationFailed(e.to_string()))?;
        let instance = HINSTANCE(module.0);

        let class = WNDCLASSW {
            lpfnWndProc: Some(window_proc),
            hInstance: instance,
            lpszClassName: WINDOW_CLASS,
            ..Default::default()
        };
        // SAFETY: class is fully initialised and WINDOW_CLASS is a static string.
        if unsafe { RegisterClassW(&class) } == 0 {
            return Err(CaptureError::WindowCreationFailed(
                "RegisterClassW returned 0".to_string(),
            ));
        }

        // SAFETY: the class was registered above; the window is never shown.
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                WINDOW_CLASS,
                w!("Chatter Guard"),
                WS_OVERLAPPED,
                0,
                0,
                0,
                0,
                None,
                None,
                Some(instance),
                None,
            )
        }
        .map_err(|e| {
            // SAFETY: the class was registered by this function.
            let _ = unsafe { UnregisterClassW(WINDOW_CLASS, Some(instance)) };
            CaptureError::WindowCreationFailed(e.to_string())
        })?;

        Ok(Self { hwnd, instance })
    }

    /// Subscribes the window to raw mouse input from every device.
    ///
    /// Without it the device gate never sees a device and ignores nothing.
    fn register_raw_input(&self) {
        let device = RAWINPUTDEVICE {
            usUsagePage: HID_USAGE_PAGE_GENERIC,
            usUsage: HID_USAGE_GENERIC_MOUSE,
            dwFlags: RIDEV_INPUTSINK,
            hwndTarget: self.hwnd,
        };
        // SAFETY: device targets a window owned by this thread.
        match unsafe { RegisterRawInputDevices(&[device], size_of::<RAWINPUTDEVICE>() as u32) } {
            Ok(()) => debug!("raw mouse input registered"),
            Err(e) => {
                warn!("raw mouse input unavailable, ignored-device setting has no effect: {e}")
            }
        }
    }
}

impl Drop for NotifyWindow {
    fn drop(&mut self) {
        // SAFETY: hwnd and the class were created by NotifyWindow::create on
        // this thread.
        unsafe {
            let _ = DestroyWindow(self.hwnd);
            let _ = UnregisterClassW(WINDOW_CLASS, Some(self.instance));
        }
    }
}

/// Window procedure for the notification window.
///
/// # Safety
///
/// Called by Windows on the hook thread during message dispatch.
unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    match msg {
        WM_INPUT => {
            let handle = HRAWINPUT(l_param.0 as *mut c_void);
            with_session(|session| session.on_raw_input(&RawInputHeaderResolver, handle));
        }
        WM_POWERBROADCAST => {
            let event = match w_param.0 as u32 {
                PBT_APMSUSPEND => Some(PowerEvent::Suspend),
                PBT_APMRESUMESUSPEND | PBT_APMRESUMEAUTOMATIC => Some(PowerEvent::Resume),
                _ => None,
            };
            if let Some(event) = event {
                with_session(|session| session.on_power(event));
            }
            return LRESULT(1);
        }
        _ => {}
    }
    DefWindowProcW(hwnd, msg, w_param, l_param)
}

// ── Hook thread ───────────────────────────────────────────────────────────────

/// Handle to the running hook thread.
pub struct HookThread {
    thread_id: u32,
    join: Option<JoinHandle<()>>,
}

impl HookThread {
    /// Spawns the hook thread and waits until its message loop is ready.
    ///
    /// The hook itself may still be uninstalled if Windows rejected it; the
    /// thread retries on resume and on settings changes.
    ///
    /// # Errors
    ///
    /// Returns the startup failure reported by the thread, or
    /// [`CaptureError::ThreadExited`] if it died without reporting.
    pub fn spawn(snapshots: Arc<SnapshotCell>) -> Result<Self, CaptureError> {
        let (ready_tx, ready_rx) = mpsc::channel();

        let join = thread::Builder::new()
            .name("chatter-hook-loop".to_string())
            .spawn(move || run_hook_thread(snapshots, ready_tx))
            .map_err(|e| CaptureError::ThreadSpawnFailed(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => Ok(Self {
                thread_id,
                join: Some(join),
            }),
            Ok(Err(e)) => {
                let _ = join.join();
                Err(e)
            }
            Err(_) => {
                let _ = join.join();
                Err(CaptureError::ThreadExited)
            }
        }
    }

    fn post(thread_id: u32, msg: u32) -> Result<(), CaptureError> {
        // SAFETY: posting to a thread id has no memory-safety requirements;
        // a stale id simply fails.
        unsafe { PostThreadMessageW(thread_id, msg, WPARAM(0), LPARAM(0)) }
            .map_err(|e| CaptureError::PostFailed(e.to_string()))
    }
}

impl CaptureService for HookThread {
    fn waker(&self) -> SettingsListener {
        let thread_id = self.thread_id;
        Arc::new(move || {
            if let Err(e) = HookThread::post(thread_id, WM_RECONCILE) {
                warn!("{e}");
            }
        })
    }

    fn shutdown(mut self: Box<Self>) {
        let thread_id = self.thread_id;
        if let Some(join) = self.join.take() {
            stop_worker(|| HookThread::post(thread_id, WM_QUIT), join);
        }
    }
}

/// Entry point for the dedicated hook thread.
fn run_hook_thread(snapshots: Arc<SnapshotCell>, ready: Sender<Result<u32, CaptureError>>) {
    let window = match NotifyWindow::create() {
        Ok(window) => window,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    window.register_raw_input();

    // A failed install is logged by `start`; the thread keeps running so a
    // resume or settings change can install the hook later.
    let session = GuardSession::new(WindowsMouseHook::default(), snapshots);
    session.start();
    SESSION.with(|cell| *cell.borrow_mut() = Some(session));

    // SAFETY: GetCurrentThreadId has no preconditions.
    let thread_id = unsafe { GetCurrentThreadId() };
    if ready.send(Ok(thread_id)).is_err() {
        return;
    }
    info!(thread_id, "hook thread running");

    pump_messages();

    if let Some(session) = SESSION.with(|cell| cell.borrow_mut().take()) {
        session.shutdown();
    }
    drop(window);
    info!("hook thread stopped");
}

/// Win32 message loop; returns on `WM_QUIT` or a `GetMessageW` failure.
fn pump_messages() {
    let mut msg = MSG::default();
    loop {
        // SAFETY: Standard Win32 GetMessage/DispatchMessage loop pattern.
        let status = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        match status.0 {
            0 => break,
            -1 => {
                error!("GetMessageW failed; stopping hook thread");
                break;
            }
            _ => {}
        }

        if msg.message == WM_RECONCILE {
            let state = with_session(|session| session.on_settings_changed());
            debug!(?state, "hook reconciled after settings change");
            continue;
        }

        // SAFETY: msg was filled in by GetMessageW.
        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}
