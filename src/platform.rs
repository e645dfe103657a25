//! Host primitives the hook layer consumes.
//!
//! The platform owns the actual entry-point swap and the call into a saved entry point.
//! A `HookedWindow` never touches the native API directly; it receives an
//! `Arc<dyn DispatchPlatform>` and talks to it through three calls:
//! * `install` – replace the window's entry point with the platform's intercept procedure,
//!   routing intercepted messages to a `MessageSink`, and hand back the previous entry point.
//! * `restore` – put a previously captured entry point back and drop the route.
//! * `forward` – deliver a message to a saved entry point and return its result word.

use std::sync::Weak;

use crate::error::Result;
use crate::message::{DispatchTarget, Message, WindowId};

/// Receiver of intercepted messages for one window. Returns the result word handed back
/// to the platform.
pub trait MessageSink: Send + Sync {
    fn dispatch(&self, message: &mut Message) -> isize;
}

/// Entry points captured by a successful install.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Installation {
    /// Entry point that was active before the intercept went in.
    pub previous: DispatchTarget,
    /// The intercept procedure now installed.
    pub installed: DispatchTarget,
}

/// Native entry-point operations behind every hook.
pub trait DispatchPlatform: Send + Sync {
    /// Install the intercept procedure for `window`.
    ///
    /// `sink` may not be upgradable yet when a message arrives (the hook is still being
    /// constructed); such messages must go straight to the previous entry point.
    /// Some platform versions only allow one install per window instance, so callers never
    /// install twice for the same window.
    fn install(&self, window: WindowId, sink: Weak<dyn MessageSink>) -> Result<Installation>;

    /// Put `original` back as the entry point of `window`.
    fn restore(&self, window: WindowId, original: DispatchTarget);

    /// Deliver `message` to `target` and return its result word.
    fn forward(&self, target: DispatchTarget, message: &Message) -> isize;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic in-memory platform for unit tests.

    use std::collections::{HashMap, HashSet};
    use std::sync::mpsc::{Receiver, Sender, channel};
    use std::sync::{Mutex, Weak};

    use super::{DispatchPlatform, Installation, MessageSink};
    use crate::error::{HookError, Result};
    use crate::message::{DispatchTarget, Message, WindowId};

    /// Result word every forward returns unless overridden.
    pub const FORWARD_RESULT: isize = 0x5A;
    const INTERCEPT: DispatchTarget = DispatchTarget(0xFEED);

    pub fn original_for(window: WindowId) -> DispatchTarget {
        DispatchTarget(0x1000 + window.0 as usize)
    }

    #[derive(Default)]
    pub struct FakePlatform {
        installs: Mutex<Vec<WindowId>>,
        restores: Mutex<Vec<(WindowId, DispatchTarget)>>,
        forwarded: Mutex<Vec<(DispatchTarget, Message)>>,
        sinks: Mutex<HashMap<WindowId, Weak<dyn MessageSink>>>,
        failing: Mutex<HashSet<WindowId>>,
        failing_once: Mutex<HashSet<WindowId>>,
        gates: Mutex<HashMap<WindowId, Receiver<()>>>,
    }

    impl FakePlatform {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_install_for(&self, window: WindowId) {
            self.failing.lock().unwrap().insert(window);
        }

        /// Fail only the next install for `window`; later installs succeed.
        pub fn fail_next_install_for(&self, window: WindowId) {
            self.failing_once.lock().unwrap().insert(window);
        }

        /// Make the next install for `window` block until the returned sender fires.
        pub fn gate_install_for(&self, window: WindowId) -> Sender<()> {
            let (tx, rx) = channel();
            self.gates.lock().unwrap().insert(window, rx);
            tx
        }

        pub fn installs(&self) -> Vec<WindowId> {
            self.installs.lock().unwrap().clone()
        }

        pub fn restores(&self) -> Vec<(WindowId, DispatchTarget)> {
            self.restores.lock().unwrap().clone()
        }

        pub fn forwarded(&self) -> Vec<(DispatchTarget, Message)> {
            self.forwarded.lock().unwrap().clone()
        }

        /// Emulate the platform delivering a message to a hooked window.
        pub fn deliver(&self, message: &mut Message) -> isize {
            let sink = self
                .sinks
                .lock()
                .unwrap()
                .get(&message.window)
                .and_then(Weak::upgrade);
            match sink {
                Some(sink) => sink.dispatch(message),
                None => self.forward(original_for(message.window), message),
            }
        }
    }

    impl DispatchPlatform for FakePlatform {
        fn install(&self, window: WindowId, sink: Weak<dyn MessageSink>) -> Result<Installation> {
            let gate = self.gates.lock().unwrap().remove(&window);
            if let Some(gate) = gate {
                let _ = gate.recv();
            }
            let fail_once = self.failing_once.lock().unwrap().remove(&window);
            if fail_once || self.failing.lock().unwrap().contains(&window) {
                return Err(HookError::HookInstallationFailed {
                    window,
                    reason: "window handle is invalid".into(),
                });
            }
            self.installs.lock().unwrap().push(window);
            self.sinks.lock().unwrap().insert(window, sink);
            Ok(Installation {
                previous: original_for(window),
                installed: INTERCEPT,
            })
        }

        fn restore(&self, window: WindowId, original: DispatchTarget) {
            self.sinks.lock().unwrap().remove(&window);
            self.restores.lock().unwrap().push((window, original));
        }

        fn forward(&self, target: DispatchTarget, message: &Message) -> isize {
            self.forwarded
                .lock()
                .unwrap()
                .push((target, message.clone()));
            FORWARD_RESULT
        }
    }
}
