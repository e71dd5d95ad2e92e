//! The item store interface.
//!
//! An item store owns the loaded input items as an order-preserving tree.
//! Index proxies never own items; they read the store through this trait and
//! listen to its [`ModelSignals`].

use hapsolutely_core::ModelSignals;

use crate::error::StoreError;
use crate::index::{StoreChange, StoreIndex};
use crate::item::{FileInfo, Item, ItemId};

/// A mutable, order-preserving hierarchical collection of items.
///
/// Parents are addressed as `Option<ItemId>`, where `None` is the invisible
/// root above the top-level items.
///
/// # Notifications
///
/// Implementations emit every structural mutation as a `rows_about_to_be_*`
/// / `rows_*` pair carrying one [`StoreChange`] stamped when the mutation
/// happens, metadata refreshes as `data_changed`, and clearing as a reset.
pub trait ItemStore: Send + Sync {
    /// Number of children under `parent`.
    fn child_count(&self, parent: Option<ItemId>) -> usize;

    /// The child at `row` under `parent`.
    fn child_at(&self, parent: Option<ItemId>, row: usize) -> Option<ItemId>;

    /// Parent of `id`; `None` for top-level or unknown items.
    fn parent_of(&self, id: ItemId) -> Option<ItemId>;

    /// Current row of `id` within its parent.
    fn row_of(&self, id: ItemId) -> Option<usize>;

    /// A copy of the item.
    fn item(&self, id: ItemId) -> Option<Item>;

    /// Adds a file as the last child of `parent`.
    fn add_file(&self, parent: ItemId, info: FileInfo) -> Result<ItemId, StoreError>;

    /// The store's change notifications.
    fn signals(&self) -> &ModelSignals<StoreChange>;

    // -------------------------------------------------------------------------
    // Convenience methods
    // -------------------------------------------------------------------------

    /// Returns `true` if the store holds `id`.
    fn contains(&self, id: ItemId) -> bool {
        self.item(id).is_some()
    }

    /// The current index of `id`.
    fn index_of(&self, id: ItemId) -> Option<StoreIndex> {
        let row = self.row_of(id)?;
        Some(StoreIndex::new(id, row, self.parent_of(id)))
    }

    /// The index of the child at `row` under `parent`.
    fn index(&self, parent: Option<ItemId>, row: usize) -> Option<StoreIndex> {
        let id = self.child_at(parent, row)?;
        Some(StoreIndex::new(id, row, parent))
    }

    /// The children of `parent`, in order.
    fn children(&self, parent: Option<ItemId>) -> Vec<ItemId> {
        (0..self.child_count(parent))
            .filter_map(|row| self.child_at(parent, row))
            .collect()
    }
}
