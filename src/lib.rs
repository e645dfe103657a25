//! Native window-procedure interception with listener multiplexing.
//!
//! A `WindowHookManager` keeps one `HookedWindow` per window handle. The first listener
//! registered for a window swaps the window's dispatch entry point for an intercept; every
//! message then runs through the registered listeners in registration order until one claims
//! it. A claimed message is absorbed; anything unclaimed continues to the original entry
//! point. The destroy message always reaches the original, after which the hook restores
//! the original entry point and leaves the registry.
//!
//! The host primitive (swap an entry point, call a saved one) sits behind
//! `DispatchPlatform`; `win32::Win32Platform` implements it with `SetWindowLongPtrW` and
//! `CallWindowProcW`.

pub mod error;
pub mod hooked_window;
pub mod manager;
pub mod message;
pub mod platform;
#[cfg(windows)]
pub mod win32;

pub use error::{HookError, Result};
pub use hooked_window::{EvictionHandler, HookedWindow, InstallPhase, MessageCallback};
pub use manager::WindowHookManager;
pub use message::{DispatchTarget, Message, MessageKind, WindowId};
pub use platform::{DispatchPlatform, Installation, MessageSink};
