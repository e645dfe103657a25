//! Interception state for one window.
//!
//! A `HookedWindow` installs the platform intercept once, keeps the entry point it replaced,
//! and fans every intercepted message out to an ordered list of listeners. Listeners are
//! always invoked on a snapshot taken under the state lock and released before the first
//! call, so a listener may attach or detach (on this or any other window) without
//! deadlocking; such changes take effect from the next message on.
//!
//! Lifecycle: `Active ⇄ Deactivated → Destroyed`. Receiving the destroy message restores
//! the original entry point, empties the listener list, and reports the window to the
//! eviction handler. Destroyed is terminal.
//!
//! The platform only holds a `Weak` route to the hook, so an installed hook keeps a strong
//! reference to itself until it is restored. Dropping every external handle (a disposed or
//! dropped manager) therefore never strands an intercept without its saved entry point.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, error, info, trace};

use crate::error::{HookError, Result};
use crate::message::{DispatchTarget, Message, WindowId};
use crate::platform::{DispatchPlatform, MessageSink};

/// Listener signature: gets the message by `&mut`, returns `true` to claim it.
pub type MessageCallback = Arc<dyn Fn(&mut Message) -> bool + Send + Sync>;

/// Invoked once with the window id when the hook finishes its destroy transition.
pub type EvictionHandler = Arc<dyn Fn(WindowId) + Send + Sync>;

/// One-way progression of the native entry-point swap. Some platform versions refuse a
/// second install on the same window instance, so there is no way back to `Installed`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InstallPhase {
    Uninstalled,
    Installed,
    Restored,
}

impl InstallPhase {
    /// Next phase, or `None` once restored.
    pub fn advance(self) -> Option<Self> {
        match self {
            Self::Uninstalled => Some(Self::Installed),
            Self::Installed => Some(Self::Restored),
            Self::Restored => None,
        }
    }
}

/// Listener identity is the `Arc` allocation, not the vtable.
fn same_callback(a: &MessageCallback, b: &MessageCallback) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

struct HookState {
    callbacks: Vec<MessageCallback>,
    deactivated: bool,
    destroyed: bool,
    phase: InstallPhase,
}

/// Installed intercept plus listener list for a single window.
pub struct HookedWindow {
    window: WindowId,
    original: DispatchTarget,
    installed: DispatchTarget,
    platform: Arc<dyn DispatchPlatform>,
    state: Mutex<HookState>,
    eviction: Mutex<Option<EvictionHandler>>,
    // Self-reference held while the intercept is installed; released by `tear_down`.
    pinned: Mutex<Option<Arc<HookedWindow>>>,
}

impl HookedWindow {
    /// Install the intercept for `window` with `first` as the only listener.
    ///
    /// The platform may route a message before construction completes; it then sees a
    /// dead `Weak` and forwards to the previous entry point itself.
    pub fn new(
        window: WindowId,
        first: MessageCallback,
        platform: Arc<dyn DispatchPlatform>,
        eviction: Option<EvictionHandler>,
    ) -> Result<Arc<Self>> {
        let mut failure = None;
        let hook = Arc::new_cyclic(|weak: &Weak<Self>| {
            let sink: Weak<dyn MessageSink> = weak.clone();
            let (original, installed, phase) = match platform.install(window, sink) {
                Ok(installation) => (
                    installation.previous,
                    installation.installed,
                    InstallPhase::Installed,
                ),
                Err(e) => {
                    failure = Some(e);
                    (
                        DispatchTarget(0),
                        DispatchTarget(0),
                        InstallPhase::Uninstalled,
                    )
                }
            };
            Self {
                window,
                original,
                installed,
                platform: platform.clone(),
                state: Mutex::new(HookState {
                    callbacks: vec![first],
                    deactivated: false,
                    destroyed: false,
                    phase,
                }),
                eviction: Mutex::new(eviction),
                pinned: Mutex::new(None),
            }
        });
        if let Some(e) = failure {
            error!(%window, ?e, "dispatch hook installation failed");
            return Err(e);
        }
        *hook.pinned.lock().unwrap_or_else(PoisonError::into_inner) = Some(hook.clone());
        info!(
            %window,
            original = %hook.original,
            installed = %hook.installed,
            "dispatch hook installed"
        );
        Ok(hook)
    }

    // Every critical section leaves the state consistent, so poison is ignored.
    fn lock_state(&self) -> MutexGuard<'_, HookState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Window this hook intercepts.
    pub fn window(&self) -> WindowId {
        self.window
    }

    /// Entry point that was active before the intercept went in.
    pub fn original_target(&self) -> DispatchTarget {
        self.original
    }

    /// Intercept procedure installed in place of the original.
    pub fn installed_target(&self) -> DispatchTarget {
        self.installed
    }

    /// Current native swap phase.
    pub fn install_phase(&self) -> InstallPhase {
        self.lock_state().phase
    }

    /// Number of listeners currently attached.
    pub fn callback_count(&self) -> usize {
        self.lock_state().callbacks.len()
    }

    /// True while the listener list is empty and messages pass straight through.
    pub fn is_deactivated(&self) -> bool {
        self.lock_state().deactivated
    }

    /// True once the destroy message has been handled. Terminal.
    pub fn is_destroyed(&self) -> bool {
        self.lock_state().destroyed
    }

    /// Replace the handler told about this window's destroy; `None` unwires it.
    pub fn set_eviction_handler(&self, handler: Option<EvictionHandler>) {
        *self
            .eviction
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = handler;
    }

    /// Add `callback` at the end of the dispatch order. Re-adding a registered listener is
    /// a no-op. Fails once the window has been destroyed.
    pub fn attach(&self, callback: MessageCallback) -> Result<()> {
        let mut state = self.lock_state();
        if state.destroyed {
            return Err(HookError::InvalidState {
                window: self.window,
                operation: "attach",
            });
        }
        if state.callbacks.iter().any(|c| same_callback(c, &callback)) {
            debug!(window = %self.window, "listener already attached");
        } else {
            state.callbacks.push(callback);
        }
        state.deactivated = false;
        Ok(())
    }

    /// Remove `callback` if present; the hook deactivates when the last listener leaves.
    pub fn detach(&self, callback: &MessageCallback) {
        let mut state = self.lock_state();
        if state.deactivated {
            debug!(window = %self.window, "detach on deactivated hook ignored");
            return;
        }
        let before = state.callbacks.len();
        state.callbacks.retain(|c| !same_callback(c, callback));
        if state.callbacks.len() == before {
            debug!(window = %self.window, "detach of unknown listener ignored");
        }
        if state.callbacks.is_empty() {
            state.deactivated = true;
            debug!(window = %self.window, "last listener detached; hook deactivated");
        }
    }

    /// Drop every listener. The intercept stays installed so a later `attach` resumes
    /// without reinstalling.
    pub fn clear_all(&self) {
        let mut state = self.lock_state();
        if state.deactivated {
            return;
        }
        state.callbacks.clear();
        state.deactivated = true;
        debug!(window = %self.window, "listeners cleared; hook deactivated");
    }

    /// Run `callback`, treating a panic as "not claimed".
    fn invoke(&self, index: usize, callback: &MessageCallback, message: &mut Message) -> bool {
        match catch_unwind(AssertUnwindSafe(|| callback(message))) {
            Ok(claimed) => claimed,
            Err(_) => {
                error!(
                    window = %self.window,
                    index,
                    kind = ?message.kind,
                    "listener panicked; continuing with the next listener"
                );
                false
            }
        }
    }

    /// Terminal transition. Runs at most once; later calls find `destroyed` already set.
    fn tear_down(&self) {
        {
            let mut state = self.lock_state();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.deactivated = true;
            state.callbacks.clear();
            if let Some(next) = state.phase.advance() {
                state.phase = next;
            }
        }
        self.platform.restore(self.window, self.original);
        info!(window = %self.window, original = %self.original, "dispatch hook restored");
        let handler = self
            .eviction
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(handler) = handler {
            handler(self.window);
        }
        // The caller still holds a strong handle for the in-flight dispatch.
        let released = self
            .pinned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(released);
    }
}

impl MessageSink for HookedWindow {
    fn dispatch(&self, message: &mut Message) -> isize {
        let destroy = message.kind.is_destroy();
        // A deactivated hook has no listeners to consult but must still restore on destroy.
        let snapshot = {
            let state = self.lock_state();
            if state.destroyed || (state.deactivated && !destroy) {
                None
            } else {
                Some(state.callbacks.clone())
            }
        };
        let Some(snapshot) = snapshot else {
            return self.platform.forward(self.original, message);
        };

        trace!(window = %self.window, kind = ?message.kind, listeners = snapshot.len(), "dispatch");
        for (index, callback) in snapshot.iter().enumerate() {
            if self.invoke(index, callback, message) {
                if !destroy {
                    trace!(window = %self.window, kind = ?message.kind, index, "claimed");
                    return message.result;
                }
                debug!(window = %self.window, index, "destroy claimed; still forwarding");
                break;
            }
        }

        if destroy {
            self.tear_down();
        }
        let result = self.platform.forward(self.original, message);
        message.result = result;
        result
    }
}
