//! Win32 window-procedure subclassing.
//!
//! `Win32Platform` swaps a window's `GWLP_WNDPROC` for `intercept_proc`, a single raw
//! window procedure shared by every hooked window. Because the raw procedure cannot capture
//! state, a process-wide route table maps each window handle to its `MessageSink` and the
//! procedure that was active before the swap. Message delivery only takes the table's read
//! lock, so hooked windows on different threads never queue behind each other. The write
//! lock is held across the swap itself, so `intercept_proc` never observes a hooked window
//! without a route.
//!
//! Messages arriving while the sink cannot be upgraded (hook still under construction) go
//! straight to the saved procedure with `CallWindowProcW`.

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tracing::{debug, trace, warn};
use windows::Win32::Foundation::{
    GetLastError, HWND, LPARAM, LRESULT, SetLastError, WIN32_ERROR, WPARAM,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallWindowProcW, DefWindowProcW, GWLP_WNDPROC, SetWindowLongPtrW, WNDPROC,
};

use crate::error::{HookError, Result};
use crate::message::{DispatchTarget, Message, WindowId};
use crate::platform::{DispatchPlatform, Installation, MessageSink};

struct Route {
    sink: Weak<dyn MessageSink>,
    original: DispatchTarget,
}

type RouteTable = HashMap<isize, Route>;

static ROUTES: OnceCell<RwLock<RouteTable>> = OnceCell::new();

fn route_table() -> &'static RwLock<RouteTable> {
    ROUTES.get_or_init(|| RwLock::new(HashMap::new()))
}

fn routes() -> RwLockReadGuard<'static, RouteTable> {
    route_table()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}

fn routes_mut() -> RwLockWriteGuard<'static, RouteTable> {
    route_table()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
}

fn hwnd_of(window: WindowId) -> HWND {
    HWND(window.0 as *mut core::ffi::c_void)
}

fn window_of(hwnd: HWND) -> WindowId {
    WindowId(hwnd.0 as isize)
}

fn as_wndproc(target: DispatchTarget) -> WNDPROC {
    // SAFETY: targets only ever come from GWLP_WNDPROC values or `intercept_proc` itself;
    // WNDPROC is a nullable function pointer of the same width as usize.
    unsafe { std::mem::transmute::<usize, WNDPROC>(target.0) }
}

fn call_original(
    target: DispatchTarget,
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    unsafe { CallWindowProcW(as_wndproc(target), hwnd, msg, wparam, lparam) }
}

/// Shared intercept procedure installed on every hooked window.
unsafe extern "system" fn intercept_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let route = routes()
        .get(&(hwnd.0 as isize))
        .map(|r| (r.sink.clone(), r.original));
    let Some((sink, original)) = route else {
        // Route already dropped by a restore; nothing left to chain to.
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    };
    match sink.upgrade() {
        Some(sink) => {
            let mut message = Message::from_raw(window_of(hwnd), msg, wparam.0, lparam.0);
            LRESULT(sink.dispatch(&mut message))
        }
        None => {
            trace!(window = %window_of(hwnd), msg, "hook not ready; forwarding to original");
            call_original(original, hwnd, msg, wparam, lparam)
        }
    }
}

/// Window-procedure swapping via `SetWindowLongPtrW`.
#[derive(Default, Clone, Copy)]
pub struct Win32Platform;

impl DispatchPlatform for Win32Platform {
    fn install(&self, window: WindowId, sink: Weak<dyn MessageSink>) -> Result<Installation> {
        let installed = DispatchTarget(intercept_proc as usize);
        let mut table = routes_mut();
        if table.contains_key(&window.0) {
            return Err(HookError::HookInstallationFailed {
                window,
                reason: "window procedure already intercepted".into(),
            });
        }
        // SetWindowLongPtrW returns 0 both on failure and for a null previous value; the
        // last-error code disambiguates.
        let previous = unsafe {
            SetLastError(WIN32_ERROR(0));
            SetWindowLongPtrW(hwnd_of(window), GWLP_WNDPROC, installed.0 as isize)
        };
        if previous == 0 {
            let code = unsafe { GetLastError() };
            if code.0 != 0 {
                return Err(HookError::HookInstallationFailed {
                    window,
                    reason: format!("SetWindowLongPtrW failed (error {})", code.0),
                });
            }
        }
        let previous = DispatchTarget(previous as usize);
        table.insert(
            window.0,
            Route {
                sink,
                original: previous,
            },
        );
        debug!(%window, %previous, %installed, "window procedure swapped");
        Ok(Installation {
            previous,
            installed,
        })
    }

    fn restore(&self, window: WindowId, original: DispatchTarget) {
        let mut table = routes_mut();
        let swapped = unsafe {
            SetLastError(WIN32_ERROR(0));
            SetWindowLongPtrW(hwnd_of(window), GWLP_WNDPROC, original.0 as isize)
        };
        if swapped == 0 {
            let code = unsafe { GetLastError() };
            if code.0 != 0 {
                warn!(%window, error = code.0, "failed to restore window procedure");
            }
        }
        table.remove(&window.0);
    }

    fn forward(&self, target: DispatchTarget, message: &Message) -> isize {
        call_original(
            target,
            hwnd_of(message.window),
            message.kind.code(),
            WPARAM(message.wparam),
            LPARAM(message.lparam),
        )
        .0
    }
}
