//! Error types for item stores and index proxies.

use crate::item::ItemId;

/// Errors from item store mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The parent to insert under does not exist.
    #[error("Unknown parent item {0:?}")]
    UnknownParent(ItemId),

    /// The item does not exist (or was already removed).
    #[error("Unknown item {0:?}")]
    UnknownItem(ItemId),

    /// Files can only be refreshed with new file metadata.
    #[error("Item {0:?} is not a file")]
    NotAFile(ItemId),
}

/// Errors from index proxy lookups.
///
/// All of these are caller errors: the expected recovery is to fall back to
/// the proxy's default index, which [`IndexProxy::select`] does.
///
/// [`IndexProxy::select`]: crate::IndexProxy::select
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyError {
    /// The outward row is negative or past the last row.
    #[error("Row {row} is out of range (row count {row_count})")]
    OutOfRange { row: isize, row_count: usize },

    /// The outward row is a generated alternative that is currently disabled.
    #[error("Row {row} is a disabled alternative")]
    DisabledAlternative { row: usize },

    /// The store item is not a direct child of the proxy root.
    #[error("Item {0:?} is not visible through this proxy")]
    NotVisible(ItemId),

    /// The item behind a row no longer exists in the store.
    #[error("Unknown item {0:?}")]
    UnknownItem(ItemId),

    /// A store mutation requested through the proxy failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type alias for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;
