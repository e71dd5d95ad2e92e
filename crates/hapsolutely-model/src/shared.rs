//! The shared result slot.
//!
//! One previously computed result (for example the output of a phasing run)
//! can be offered as an input to every task. The slot holds the store item of
//! that result and notifies subscribers on every write that changes it. It is
//! passed explicitly to the proxies that observe it; there is no global
//! instance.

use std::sync::Arc;

use hapsolutely_core::{ConnectionId, Signal, Stamp, next_stamp};
use parking_lot::{ReentrantMutex, RwLock};

use crate::item::ItemId;
use hapsolutely_core::logging::targets;

/// Notification emitted when the shared result changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedResultChange {
    pub previous: Option<ItemId>,
    pub current: Option<ItemId>,
    pub stamp: Stamp,
}

/// A single-value slot holding the current shared result, if any.
///
/// Writers are serialized: each write that changes the value emits exactly
/// one [`SharedResultChange`], and a second writer waits until every
/// subscriber has seen the first change.
pub struct SharedResultSlot {
    current: RwLock<Option<ItemId>>,
    writer: ReentrantMutex<()>,
    changed: Signal<SharedResultChange>,
}

impl SharedResultSlot {
    /// Creates an empty slot.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            current: RwLock::new(None),
            writer: ReentrantMutex::new(()),
            changed: Signal::new(),
        })
    }

    /// The current shared result.
    pub fn get(&self) -> Option<ItemId> {
        *self.current.read()
    }

    /// Whether a shared result exists.
    pub fn is_present(&self) -> bool {
        self.current.read().is_some()
    }

    /// Replaces the shared result.
    ///
    /// Returns `false` (and notifies nobody) if the value is unchanged.
    pub fn set(&self, value: Option<ItemId>) -> bool {
        let _writer = self.writer.lock();
        let previous = {
            let mut current = self.current.write();
            if *current == value {
                return false;
            }
            std::mem::replace(&mut *current, value)
        };

        let change = SharedResultChange {
            previous,
            current: value,
            stamp: next_stamp(),
        };
        tracing::debug!(target: targets::SHARED_RESULT, ?previous, current = ?value, "shared result changed");
        self.changed.emit(change);
        true
    }

    /// Removes the shared result.
    pub fn clear(&self) -> bool {
        self.set(None)
    }

    /// Registers a subscriber for changes.
    pub fn subscribe<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&SharedResultChange) + Send + Sync + 'static,
    {
        self.changed.connect(slot)
    }

    /// Removes a subscriber. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: ConnectionId) -> bool {
        self.changed.disconnect(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.changed.connection_count()
    }
}
