//! Demo host window and message loop.
//!
//! A plain top-level window whose own window procedure only handles WM_DESTROY (posting
//! WM_QUIT). That makes the destroy path observable: the loop only ends through WM_DESTROY
//! if the hook forwarded it to this procedure.

use anyhow::{Result, anyhow};
use once_cell::sync::OnceCell;
use tracing::debug;
use widestring::U16CString;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, CreateWindowExW, DefWindowProcW, DispatchMessageW,
    GetMessageW, MSG, PostQuitMessage, RegisterClassW, SW_SHOW, ShowWindow, TranslateMessage,
    WINDOW_EX_STYLE, WM_DESTROY, WNDCLASSW, WS_OVERLAPPEDWINDOW,
};
use windows::core::PCWSTR;

static HOST_CLASS: OnceCell<U16CString> = OnceCell::new();

unsafe extern "system" fn host_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_DESTROY {
        unsafe { PostQuitMessage(0) };
        return LRESULT(0);
    }
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}

fn register_class() -> Result<&'static U16CString> {
    HOST_CLASS.get_or_try_init(|| -> Result<U16CString> {
        let class = U16CString::from_str("WndmuxDemoHost")?;
        let instance = unsafe { GetModuleHandleW(None)? };
        let wc = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(host_proc),
            hInstance: instance.into(),
            lpszClassName: PCWSTR(class.as_ptr()),
            ..Default::default()
        };
        if unsafe { RegisterClassW(&wc) } == 0 {
            return Err(anyhow!("RegisterClassW failed"));
        }
        Ok(class)
    })
}

/// Create and show the demo window.
pub fn create_demo_window(title: &str) -> Result<HWND> {
    let class = register_class()?;
    let title = U16CString::from_str(title)?;
    let instance = unsafe { GetModuleHandleW(None)? };
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            PCWSTR(class.as_ptr()),
            PCWSTR(title.as_ptr()),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            640,
            360,
            None,
            None,
            Some(instance.into()),
            None,
        )?
    };
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
    }
    Ok(hwnd)
}

/// Pump messages for the calling thread until WM_QUIT and return its exit code.
pub fn run_message_loop() -> Result<i32> {
    let mut msg = MSG::default();
    let mut pumped: u64 = 0;
    loop {
        match unsafe { GetMessageW(&mut msg, None, 0, 0) }.0 {
            -1 => return Err(anyhow!("GetMessageW failed after {pumped} messages")),
            0 => {
                debug!(pumped, "WM_QUIT received");
                return Ok(msg.wParam.0 as i32);
            }
            _ => {
                pumped += 1;
                unsafe {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
        }
    }
}
