//! Directory of hooked windows.
//!
//! The manager is an explicitly owned object: build one at composition time with the
//! platform it should drive and hand out references. Each window gets its own slot; the
//! registry lock only covers map lookups and edits, while everything that touches a
//! particular window (install, attach, detach) serializes on that window's slot. Installing
//! a hook on one window therefore never holds up registration on another.
//!
//! Lock order where both are held: registry map, then slot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, info};

use crate::error::Result;
use crate::hooked_window::{EvictionHandler, HookedWindow, MessageCallback};
use crate::message::WindowId;
use crate::platform::DispatchPlatform;

/// Occupancy of one window's slot.
enum SlotState {
    /// First install in flight (or about to be).
    Pending,
    Hooked(Arc<HookedWindow>),
    /// The install that created this slot failed; the slot is being unlinked and must not
    /// be reused. Registrars that find it start over from the map lookup.
    Vacated,
}

impl SlotState {
    fn hook(&self) -> Option<&Arc<HookedWindow>> {
        match self {
            Self::Hooked(hook) => Some(hook),
            Self::Pending | Self::Vacated => None,
        }
    }
}

type Slot = Arc<Mutex<SlotState>>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Registry {
    platform: Arc<dyn DispatchPlatform>,
    windows: Mutex<HashMap<WindowId, Slot>>,
}

impl Registry {
    fn slot(&self, window: WindowId) -> Option<Slot> {
        lock(&self.windows).get(&window).cloned()
    }

    /// Map entry for `window`, creating a pending slot when there is none.
    fn slot_or_insert(&self, window: WindowId) -> Slot {
        lock(&self.windows)
            .entry(window)
            .or_insert_with(|| Arc::new(Mutex::new(SlotState::Pending)))
            .clone()
    }

    /// Remove `slot` from the map if it is still the entry for `window`.
    fn unlink(&self, window: WindowId, slot: &Slot) {
        let mut windows = lock(&self.windows);
        if windows.get(&window).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            windows.remove(&window);
        }
    }

    /// Drop the entry for `window` if its hook has been destroyed. Repeated or late calls
    /// find nothing to do.
    fn on_window_destroyed(&self, window: WindowId) {
        let mut windows = lock(&self.windows);
        let destroyed = match windows.get(&window) {
            Some(slot) => lock(slot).hook().is_some_and(|hook| hook.is_destroyed()),
            None => false,
        };
        if destroyed {
            windows.remove(&window);
            info!(%window, "window destroyed; hook evicted");
        } else {
            debug!(%window, "eviction for unknown or live window ignored");
        }
    }
}

/// Registry of hooked windows, one `HookedWindow` per window.
pub struct WindowHookManager {
    registry: Arc<Registry>,
}

impl WindowHookManager {
    /// Empty manager installing hooks through `platform`.
    pub fn new(platform: Arc<dyn DispatchPlatform>) -> Self {
        Self {
            registry: Arc::new(Registry {
                platform,
                windows: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn eviction_handler(&self) -> EvictionHandler {
        let registry: Weak<Registry> = Arc::downgrade(&self.registry);
        Arc::new(move |window| {
            if let Some(registry) = registry.upgrade() {
                registry.on_window_destroyed(window);
            }
        })
    }

    /// Route `callback` to `window`, installing the hook on first use.
    ///
    /// Fails with `HookInstallationFailed` when the platform rejects the install and with
    /// `InvalidState` when the window was destroyed while this call was in flight.
    pub fn register(&self, window: WindowId, callback: MessageCallback) -> Result<()> {
        loop {
            let slot = self.registry.slot_or_insert(window);
            let mut state = lock(&slot);
            if let Some(existing) = state.hook() {
                existing.attach(callback)?;
                existing.set_eviction_handler(Some(self.eviction_handler()));
                return Ok(());
            }
            if matches!(*state, SlotState::Vacated) {
                drop(state);
                self.registry.unlink(window, &slot);
                debug!(%window, "slot vacated by a failed install; retrying");
                continue;
            }

            return match HookedWindow::new(
                window,
                callback,
                self.registry.platform.clone(),
                Some(self.eviction_handler()),
            ) {
                Ok(created) => {
                    *state = SlotState::Hooked(created);
                    Ok(())
                }
                Err(e) => {
                    // Waiters on this slot must not install into it once it is unlinked.
                    *state = SlotState::Vacated;
                    drop(state);
                    self.registry.unlink(window, &slot);
                    Err(e)
                }
            };
        }
    }

    /// Remove `callback` from `window`. Unknown windows and listeners are ignored; the hook
    /// may already be gone.
    pub fn unregister(&self, window: WindowId, callback: &MessageCallback) {
        let Some(slot) = self.registry.slot(window) else {
            debug!(%window, "unregister for window without hook ignored");
            return;
        };
        let state = lock(&slot);
        if let Some(hook) = state.hook() {
            hook.detach(callback);
            if hook.callback_count() == 0 {
                hook.clear_all();
            }
        }
    }

    /// Shutdown path: unwire eviction from every hook, clear every hook, then empty the
    /// registry. Intercepts stay installed and pass messages straight through; each hook
    /// keeps itself alive until its window's destroy restores the original entry point.
    pub fn dispose_all(&self) {
        let hooks: Vec<Arc<HookedWindow>> = {
            let slots: Vec<Slot> = lock(&self.registry.windows).values().cloned().collect();
            slots
                .iter()
                .filter_map(|slot| lock(slot).hook().cloned())
                .collect()
        };
        for hook in &hooks {
            hook.set_eviction_handler(None);
        }
        for hook in &hooks {
            hook.clear_all();
        }
        lock(&self.registry.windows).clear();
        info!(count = hooks.len(), "all window hooks disposed");
    }

    /// True when `window` has an installed, not yet evicted hook.
    pub fn is_hooked(&self, window: WindowId) -> bool {
        self.registry
            .slot(window)
            .is_some_and(|slot| lock(&slot).hook().is_some())
    }

    /// Listeners attached to `window`; zero for unknown windows.
    pub fn callback_count(&self, window: WindowId) -> usize {
        self.registry
            .slot(window)
            .and_then(|slot| lock(&slot).hook().map(|hook| hook.callback_count()))
            .unwrap_or(0)
    }

    /// Registered windows, sorted. Includes a window whose first install is still running.
    pub fn hooked_windows(&self) -> Vec<WindowId> {
        let mut ids: Vec<WindowId> = lock(&self.registry.windows).keys().copied().collect();
        ids.sort();
        ids
    }

    /// Number of registry entries.
    pub fn len(&self) -> usize {
        lock(&self.registry.windows).len()
    }

    /// True when no window is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
