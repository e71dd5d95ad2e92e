//! Input selection model for Hapsolutely.
//!
//! Loaded input files live in an [`ItemStore`]. Each task presents the files
//! it accepts through an [`IndexProxy`], which puts a few synthetic rows in
//! front of the store rows: a "nothing selected" placeholder, the shared
//! result of a previous run, or fixed "generate automatically" alternatives.
//!
//! # Core Types
//!
//! - [`FileTree`]: In-memory [`ItemStore`] holding files under named groups
//! - [`SyntheticRowPolicy`]: Which synthetic rows precede the store rows
//! - [`SharedResultSlot`]: The previously computed result, observed by proxies
//! - [`IndexProxy`]: Translates between outward rows and store positions
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use hapsolutely_model::{FileInfo, FileTree, IndexProxy, ItemStore, ResolvedRow};
//!
//! let tree = Arc::new(FileTree::new());
//! let files = tree.add_group(None, "Sequence files").unwrap();
//! tree.add_file(files, FileInfo::fasta("sample.fas")).unwrap();
//!
//! let proxy = IndexProxy::builder(tree, files).build().unwrap();
//! assert_eq!(proxy.row_count(), 2);
//! assert!(proxy.resolve(0).unwrap().is_placeholder());
//! assert!(matches!(proxy.resolve(1).unwrap(), ResolvedRow::StoreItem(_)));
//! ```

mod error;
mod file_tree;
mod index;
mod item;
pub mod policy;
mod proxy;
mod shared;
mod store;

pub use error::{ProxyError, Result, StoreError};
pub use file_tree::FileTree;
pub use index::{ChangeKind, ChangePhase, OutwardChange, RowRange, StoreChange, StoreIndex};
pub use item::{FileFormat, FileInfo, Item, ItemId, ItemKind};
pub use policy::{Alternative, SyntheticKind, SyntheticRowPolicy};
pub use proxy::{
    IndexProxy, IndexProxyBuilder, ResolvedRow, Selection, SelectionSnapshot, StoreItem,
    SyntheticRow,
};
pub use shared::{SharedResultChange, SharedResultSlot};
pub use store::ItemStore;
