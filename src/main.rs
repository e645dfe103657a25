//! Demo host for the window hook manager.
//!
//! Creates a top-level window, hooks its window procedure through a `WindowHookManager`,
//! and logs every intercepted message. Optionally swallows WM_CLOSE to show a claiming
//! listener. Runs until the window is destroyed or Ctrl+C posts WM_QUIT.

mod cli;
mod logging;
#[cfg(windows)]
mod winhost;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::Cli;
use logging::configure_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    configure_logging(cli.log_level());
    info!(
        version = env!("CARGO_PKG_VERSION"),
        ?cli,
        "starting wndmux"
    );
    run(&cli)
}

#[cfg(windows)]
fn run(cli: &Cli) -> Result<()> {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tracing::trace;
    use windows::Win32::Foundation::{LPARAM, WPARAM};
    use windows::Win32::System::Threading::GetCurrentThreadId;
    use windows::Win32::UI::WindowsAndMessaging::{PostThreadMessageW, WM_QUIT};
    use wndmux::win32::Win32Platform;
    use wndmux::{Message, MessageCallback, MessageKind, WindowHookManager, WindowId};

    let hwnd = winhost::create_demo_window(&cli.title)?;
    let window = WindowId(hwnd.0 as isize);
    let manager = WindowHookManager::new(Arc::new(Win32Platform));

    let seen = Arc::new(AtomicU64::new(0));
    let logger: MessageCallback = {
        let seen = seen.clone();
        Arc::new(move |m: &mut Message| {
            seen.fetch_add(1, Ordering::Relaxed);
            trace!(
                window = %m.window,
                kind = ?m.kind,
                wparam = m.wparam,
                lparam = m.lparam,
                "intercepted"
            );
            if m.kind.is_destroy() {
                info!(window = %m.window, "window destroy intercepted");
            }
            false
        })
    };
    manager.register(window, logger.clone())?;

    if cli.swallow_close {
        let closer: MessageCallback = Arc::new(|m: &mut Message| {
            if m.kind != MessageKind::Close {
                return false;
            }
            info!(window = %m.window, "close request swallowed; press Ctrl+C to exit");
            m.result = 0;
            true
        });
        manager.register(window, closer)?;
    }

    // WM_QUIT must be posted to the UI thread; posting from the handler thread is ignored.
    let main_tid = unsafe { GetCurrentThreadId() };
    ctrlc::set_handler(move || {
        info!("Ctrl+C received, shutting down");
        unsafe {
            let _ = PostThreadMessageW(main_tid, WM_QUIT, WPARAM(0), LPARAM(0));
        }
    })?;

    info!(
        %window,
        listeners = manager.callback_count(window),
        "window hooked; running message loop"
    );
    let exit_code = winhost::run_message_loop()?;

    info!(
        exit_code,
        messages = seen.load(Ordering::Relaxed),
        still_hooked = manager.is_hooked(window),
        "message loop finished"
    );
    manager.unregister(window, &logger);
    manager.dispose_all();
    Ok(())
}

#[cfg(not(windows))]
fn run(_cli: &Cli) -> Result<()> {
    anyhow::bail!("the demo host needs a Win32 desktop session")
}
