//! Change notification channels.
//!
//! Item stores, index proxies and the shared result slot announce every
//! change through a [`Signal`]. Consumers (list views, batch dialogs,
//! other proxies) connect a callback and keep their own copy in sync from
//! the notifications alone.
//!
//! Delivery is synchronous: callbacks run on the emitting thread, in the
//! order they were connected. The connection table is unlocked while
//! callbacks run, so a callback may connect, disconnect or emit again.
//!
//! ```
//! use hapsolutely_core::Signal;
//!
//! let renamed = Signal::<String>::new();
//! let id = renamed.connect(|name| println!("renamed to {name}"));
//!
//! renamed.emit("sample.fas".to_string());
//! renamed.disconnect(id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Handle of one connected callback, passed back to [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Callback<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A multicast notification channel carrying `Args`.
pub struct Signal<Args> {
    callbacks: Mutex<SlotMap<ConnectionId, Callback<Args>>>,
    muted: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    pub fn new() -> Self {
        Self {
            callbacks: Mutex::new(SlotMap::with_key()),
            muted: AtomicBool::new(false),
        }
    }

    /// Registers `callback`, to be run on every emission.
    pub fn connect<F>(&self, callback: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.callbacks.lock().insert(Arc::new(callback))
    }

    /// Removes one callback. Returns `false` if it was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.callbacks.lock().remove(id).is_some()
    }

    pub fn disconnect_all(&self) {
        self.callbacks.lock().clear();
    }

    pub fn connection_count(&self) -> usize {
        self.callbacks.lock().len()
    }

    /// Mutes or unmutes the signal. Emissions while muted are dropped.
    pub fn set_blocked(&self, blocked: bool) {
        self.muted.store(blocked, Ordering::SeqCst);
    }

    pub fn is_blocked(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    /// Runs every connected callback with `args`.
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "muted, emission dropped");
            return;
        }

        // Snapshot so callbacks can reconnect without deadlocking.
        let callbacks: Vec<Callback<Args>> = self.callbacks.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, receivers = callbacks.len(), "emit");
        for callback in &callbacks {
            callback(&args);
        }
    }
}

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);

/// Row notifications of a store or proxy.
///
/// `C` names the affected rows in the emitter's own row space. Structural
/// changes are announced twice: once before the rows move (`*_about_to_*`)
/// and once after. Consumers that mirror rows apply the change on the
/// second notification.
pub struct ModelSignals<C> {
    pub rows_about_to_be_inserted: Signal<C>,
    pub rows_inserted: Signal<C>,
    pub rows_about_to_be_removed: Signal<C>,
    pub rows_removed: Signal<C>,
    /// Rows that kept their position but changed content.
    pub data_changed: Signal<C>,
    pub model_about_to_reset: Signal<()>,
    /// Every row may have changed; consumers re-read from scratch.
    pub model_reset: Signal<()>,
}

impl<C: Clone + 'static> Default for ModelSignals<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clone + 'static> ModelSignals<C> {
    pub fn new() -> Self {
        Self {
            rows_about_to_be_inserted: Signal::new(),
            rows_inserted: Signal::new(),
            rows_about_to_be_removed: Signal::new(),
            rows_removed: Signal::new(),
            data_changed: Signal::new(),
            model_about_to_reset: Signal::new(),
            model_reset: Signal::new(),
        }
    }

    /// Runs `mutate` between the two insertion notifications.
    ///
    /// `pending` and `done` usually describe the same rows and differ only in
    /// their phase marker.
    pub fn emit_rows_inserted<F, R>(&self, pending: C, done: C, mutate: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.rows_about_to_be_inserted.emit(pending);
        let out = mutate();
        self.rows_inserted.emit(done);
        out
    }

    /// Runs `mutate` between the two removal notifications.
    pub fn emit_rows_removed<F, R>(&self, pending: C, done: C, mutate: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.rows_about_to_be_removed.emit(pending);
        let out = mutate();
        self.rows_removed.emit(done);
        out
    }

    /// Runs `mutate` between the two reset notifications.
    pub fn emit_reset<F>(&self, mutate: F)
    where
        F: FnOnce(),
    {
        self.model_about_to_reset.emit(());
        mutate();
        self.model_reset.emit(());
    }
}
