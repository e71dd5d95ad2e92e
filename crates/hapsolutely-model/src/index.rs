//! Store positions and row-change descriptions.
//!
//! A [`StoreIndex`] addresses an item inside an item store. Like any model
//! index it should be used immediately: after insertions or removals the
//! recorded row may be stale, while the item ID stays valid until the item is
//! removed.

use hapsolutely_core::Stamp;

use crate::item::ItemId;

/// A position inside an item store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreIndex {
    id: ItemId,
    row: usize,
    parent: Option<ItemId>,
}

impl StoreIndex {
    /// Creates an index for item `id` at `row` under `parent`
    /// (`None` for top-level items).
    #[inline]
    pub fn new(id: ItemId, row: usize, parent: Option<ItemId>) -> Self {
        Self { id, row, parent }
    }

    /// The item this index refers to.
    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// The row within the parent, as of index creation.
    #[inline]
    pub fn row(&self) -> usize {
        self.row
    }

    /// The parent item, or `None` for top-level items.
    #[inline]
    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }
}

/// An inclusive range of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowRange {
    pub first: usize,
    pub last: usize,
}

impl RowRange {
    /// Creates the range `[first, last]`.
    ///
    /// # Panics
    ///
    /// Panics if `last < first`.
    pub fn new(first: usize, last: usize) -> Self {
        assert!(first <= last, "row range {first}..={last} is empty");
        Self { first, last }
    }

    /// A range covering exactly one row.
    pub fn single(row: usize) -> Self {
        Self {
            first: row,
            last: row,
        }
    }

    /// Number of rows covered.
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    /// Always `false`; ranges cover at least one row.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, row: usize) -> bool {
        self.first <= row && row <= self.last
    }

    /// The same range moved down by `offset` rows.
    pub fn shifted(&self, offset: usize) -> Self {
        Self {
            first: self.first + offset,
            last: self.last + offset,
        }
    }
}

/// The kind of a row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Removed,
    Changed,
}

/// Whether a structural change is about to happen or has happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangePhase {
    Pending,
    Done,
}

/// A change notification in store-index coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChange {
    pub kind: ChangeKind,
    pub phase: ChangePhase,
    /// Parent of the affected rows, `None` for top-level rows.
    pub parent: Option<ItemId>,
    pub range: RowRange,
    /// When the underlying mutation happened.
    pub stamp: Stamp,
}

impl StoreChange {
    /// The same change in the given phase.
    pub fn with_phase(mut self, phase: ChangePhase) -> Self {
        self.phase = phase;
        self
    }
}

/// A change notification in outward-index coordinates, as emitted by an
/// index proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutwardChange {
    pub kind: ChangeKind,
    pub phase: ChangePhase,
    pub range: RowRange,
    /// When the underlying mutation happened.
    pub stamp: Stamp,
}

impl OutwardChange {
    /// The same change in the given phase.
    pub fn with_phase(mut self, phase: ChangePhase) -> Self {
        self.phase = phase;
        self
    }
}
