//! In-memory item store.
//!
//! `FileTree` keeps loaded input files under named groups, the way the
//! application lists "Sequence files", "Partition files" and so on. It is the
//! store index proxies are built over.

use std::collections::HashMap;

use hapsolutely_core::{ModelSignals, next_stamp};
use parking_lot::{ReentrantMutex, RwLock};

use crate::error::StoreError;
use crate::index::{ChangeKind, ChangePhase, RowRange, StoreChange};
use crate::item::{FileInfo, Item, ItemId, ItemKind};
use crate::store::ItemStore;
use hapsolutely_core::logging::targets;

/// A node in the tree structure.
struct TreeNode {
    item: Item,
    children: Vec<ItemId>,
    parent: Option<ItemId>,
}

/// Internal storage for tree nodes.
struct TreeStorage {
    nodes: HashMap<ItemId, TreeNode>,
    root_children: Vec<ItemId>,
}

impl TreeStorage {
    fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            root_children: Vec::new(),
        }
    }

    /// Inserts `item` as the last child of `parent`. Returns `None` if the
    /// parent no longer exists.
    fn insert(&mut self, parent: Option<ItemId>, item: Item) -> Option<ItemId> {
        let id = item.id;
        match parent {
            None => self.root_children.push(id),
            Some(parent_id) => self.nodes.get_mut(&parent_id)?.children.push(id),
        }
        self.nodes.insert(
            id,
            TreeNode {
                item,
                children: Vec::new(),
                parent,
            },
        );
        Some(id)
    }

    fn remove_node(&mut self, id: ItemId) -> Option<Item> {
        let parent = self.nodes.get(&id)?.parent;
        match parent {
            Some(parent_id) => {
                if let Some(parent) = self.nodes.get_mut(&parent_id) {
                    parent.children.retain(|&child_id| child_id != id);
                }
            }
            None => self.root_children.retain(|&child_id| child_id != id),
        }
        self.remove_subtree(id)
    }

    fn remove_subtree(&mut self, id: ItemId) -> Option<Item> {
        let node = self.nodes.remove(&id)?;
        for child_id in node.children {
            self.remove_subtree(child_id);
        }
        Some(node.item)
    }

    fn children_of(&self, parent: Option<ItemId>) -> &[ItemId] {
        match parent {
            None => &self.root_children,
            Some(id) => self
                .nodes
                .get(&id)
                .map(|n| n.children.as_slice())
                .unwrap_or(&[]),
        }
    }

    fn parent_of(&self, id: ItemId) -> Option<ItemId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    fn row_of(&self, id: ItemId) -> Option<usize> {
        if !self.nodes.contains_key(&id) {
            return None;
        }
        let siblings = self.children_of(self.parent_of(id));
        siblings.iter().position(|&child_id| child_id == id)
    }
}

/// A hierarchical store of loaded input files.
///
/// # Example
///
/// ```
/// use hapsolutely_model::{FileInfo, FileTree, ItemStore};
///
/// let tree = FileTree::new();
/// let files = tree.add_group(None, "Sequence files").unwrap();
/// let id = tree.add_file(files, FileInfo::fasta("sample.fas")).unwrap();
///
/// assert_eq!(tree.child_count(Some(files)), 1);
/// assert_eq!(tree.parent_of(id), Some(files));
/// ```
pub struct FileTree {
    storage: RwLock<TreeStorage>,
    /// Held from the check to the done notification of a structural change.
    mutation: ReentrantMutex<()>,
    signals: ModelSignals<StoreChange>,
}

impl Default for FileTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FileTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            storage: RwLock::new(TreeStorage::new()),
            mutation: ReentrantMutex::new(()),
            signals: ModelSignals::new(),
        }
    }

    /// Adds a group under `parent` (`None` for top level) and returns its ID.
    pub fn add_group(
        &self,
        parent: Option<ItemId>,
        name: impl Into<String>,
    ) -> Result<ItemId, StoreError> {
        self.insert(parent, Item::group(name))
    }

    /// Removes an item and all its descendants.
    ///
    /// Returns the removed item.
    pub fn remove(&self, id: ItemId) -> Result<Item, StoreError> {
        let _mutation = self.mutation.lock();
        let change = {
            let storage = self.storage.read();
            let row = storage.row_of(id).ok_or(StoreError::UnknownItem(id))?;
            StoreChange {
                kind: ChangeKind::Removed,
                phase: ChangePhase::Pending,
                parent: storage.parent_of(id),
                range: RowRange::single(row),
                stamp: next_stamp(),
            }
        };

        tracing::debug!(target: targets::STORE, ?id, row = change.range.first, "removing item");
        self.signals
            .emit_rows_removed(change, change.with_phase(ChangePhase::Done), || {
                self.storage.write().remove_node(id)
            })
            .ok_or(StoreError::UnknownItem(id))
    }

    /// Replaces the metadata of a file item.
    ///
    /// This is a data change, not a structural one: the item keeps its row.
    pub fn refresh(&self, id: ItemId, info: FileInfo) -> Result<(), StoreError> {
        let change = {
            let mut storage = self.storage.write();
            let row = storage.row_of(id).ok_or(StoreError::UnknownItem(id))?;
            let parent = storage.parent_of(id);
            let node = storage
                .nodes
                .get_mut(&id)
                .ok_or(StoreError::UnknownItem(id))?;
            match &mut node.item.kind {
                ItemKind::File(current) => {
                    node.item.name = info.file_name();
                    *current = info;
                }
                ItemKind::Group => return Err(StoreError::NotAFile(id)),
            }
            StoreChange {
                kind: ChangeKind::Changed,
                phase: ChangePhase::Done,
                parent,
                range: RowRange::single(row),
                stamp: next_stamp(),
            }
        };

        self.signals.data_changed.emit(change);
        Ok(())
    }

    /// Removes every item.
    pub fn clear(&self) {
        tracing::debug!(target: targets::STORE, "clearing store");
        self.signals.emit_reset(|| {
            let mut storage = self.storage.write();
            storage.nodes.clear();
            storage.root_children.clear();
        });
    }

    /// Returns the number of top-level items.
    pub fn root_count(&self) -> usize {
        self.storage.read().root_children.len()
    }

    /// Returns `true` if the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.storage.read().root_children.is_empty()
    }

    fn insert(&self, parent: Option<ItemId>, item: Item) -> Result<ItemId, StoreError> {
        let _mutation = self.mutation.lock();
        let change = {
            let storage = self.storage.read();
            if let Some(parent_id) = parent
                && !storage.nodes.contains_key(&parent_id)
            {
                return Err(StoreError::UnknownParent(parent_id));
            }
            StoreChange {
                kind: ChangeKind::Added,
                phase: ChangePhase::Pending,
                parent,
                range: RowRange::single(storage.children_of(parent).len()),
                stamp: next_stamp(),
            }
        };

        tracing::debug!(
            target: targets::STORE,
            name = %item.name,
            row = change.range.first,
            "adding item"
        );
        self.signals.rows_about_to_be_inserted.emit(change);
        let id = item.id;
        if self.storage.write().insert(parent, item).is_some() {
            self.signals
                .rows_inserted
                .emit(change.with_phase(ChangePhase::Done));
            return Ok(id);
        }

        // A receiver of the pending notification removed the parent.
        tracing::warn!(target: targets::STORE, ?parent, "parent removed during insert");
        self.signals.emit_reset(|| {});
        Err(parent.map_or(StoreError::UnknownItem(id), StoreError::UnknownParent))
    }
}

impl ItemStore for FileTree {
    fn child_count(&self, parent: Option<ItemId>) -> usize {
        self.storage.read().children_of(parent).len()
    }

    fn child_at(&self, parent: Option<ItemId>, row: usize) -> Option<ItemId> {
        self.storage.read().children_of(parent).get(row).copied()
    }

    fn parent_of(&self, id: ItemId) -> Option<ItemId> {
        self.storage.read().parent_of(id)
    }

    fn row_of(&self, id: ItemId) -> Option<usize> {
        self.storage.read().row_of(id)
    }

    fn item(&self, id: ItemId) -> Option<Item> {
        self.storage.read().nodes.get(&id).map(|n| n.item.clone())
    }

    fn add_file(&self, parent: ItemId, info: FileInfo) -> Result<ItemId, StoreError> {
        self.insert(Some(parent), Item::file(info))
    }

    fn signals(&self) -> &ModelSignals<StoreChange> {
        &self.signals
    }
}

static_assertions::assert_impl_all!(FileTree: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn record(tree: &FileTree) -> Arc<Mutex<Vec<(&'static str, StoreChange)>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let signals = tree.signals();

        let e = events.clone();
        signals
            .rows_about_to_be_inserted
            .connect(move |c| e.lock().push(("about_insert", *c)));
        let e = events.clone();
        signals
            .rows_inserted
            .connect(move |c| e.lock().push(("inserted", *c)));
        let e = events.clone();
        signals
            .rows_about_to_be_removed
            .connect(move |c| e.lock().push(("about_remove", *c)));
        let e = events.clone();
        signals
            .rows_removed
            .connect(move |c| e.lock().push(("removed", *c)));
        let e = events.clone();
        signals
            .data_changed
            .connect(move |c| e.lock().push(("changed", *c)));
        events
    }

    #[test]
    fn test_add_and_query() {
        let tree = FileTree::new();
        let files = tree.add_group(None, "Files").unwrap();
        let a = tree.add_file(files, FileInfo::fasta("a.fas")).unwrap();
        let b = tree.add_file(files, FileInfo::fasta("b.fas")).unwrap();

        assert_eq!(tree.root_count(), 1);
        assert_eq!(tree.child_count(Some(files)), 2);
        assert_eq!(tree.child_at(Some(files), 1), Some(b));
        assert_eq!(tree.row_of(a), Some(0));
        assert_eq!(tree.row_of(b), Some(1));
        assert_eq!(tree.parent_of(a), Some(files));
        assert_eq!(tree.children(Some(files)), vec![a, b]);
        assert_eq!(tree.item(b).unwrap().name, "b.fas");
    }

    #[test]
    fn test_add_under_unknown_parent() {
        let tree = FileTree::new();
        let files = tree.add_group(None, "Files").unwrap();
        tree.remove(files).unwrap();

        let err = tree.add_file(files, FileInfo::fasta("a.fas")).unwrap_err();
        assert_eq!(err, StoreError::UnknownParent(files));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_parent_removed_while_insert_pending() {
        use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

        let tree = Arc::new(FileTree::new());
        let files = tree.add_group(None, "Files").unwrap();

        let armed = Arc::new(AtomicBool::new(true));
        let weak = Arc::downgrade(&tree);
        let a = armed.clone();
        tree.signals().rows_about_to_be_inserted.connect(move |_| {
            if a.swap(false, Ordering::SeqCst)
                && let Some(tree) = weak.upgrade()
            {
                tree.remove(files).unwrap();
            }
        });
        let inserted = Arc::new(AtomicUsize::new(0));
        let i = inserted.clone();
        tree.signals().rows_inserted.connect(move |_| {
            i.fetch_add(1, Ordering::SeqCst);
        });
        let resets = Arc::new(AtomicUsize::new(0));
        let r = resets.clone();
        tree.signals().model_reset.connect(move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        });

        let err = tree.add_file(files, FileInfo::fasta("a.fas")).unwrap_err();
        assert_eq!(err, StoreError::UnknownParent(files));
        assert_eq!(inserted.load(Ordering::SeqCst), 0);
        assert_eq!(resets.load(Ordering::SeqCst), 1);
        assert!(tree.is_empty());
        assert!(tree.storage.read().nodes.is_empty());
    }

    #[test]
    fn test_insert_emits_stamped_pair() {
        let tree = FileTree::new();
        let files = tree.add_group(None, "Files").unwrap();
        tree.add_file(files, FileInfo::fasta("a.fas")).unwrap();
        let events = record(&tree);

        tree.add_file(files, FileInfo::fasta("b.fas")).unwrap();

        let events = events.lock();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, "about_insert");
        assert_eq!(events[1].0, "inserted");
        assert_eq!(events[0].1.parent, Some(files));
        assert_eq!(events[0].1.range, RowRange::single(1));
        assert_eq!(events[0].1.stamp, events[1].1.stamp);
        assert_eq!(events[0].1.phase, ChangePhase::Pending);
        assert_eq!(events[1].1.phase, ChangePhase::Done);
    }

    #[test]
    fn test_remove_shifts_rows() {
        let tree = FileTree::new();
        let files = tree.add_group(None, "Files").unwrap();
        let a = tree.add_file(files, FileInfo::fasta("a.fas")).unwrap();
        let b = tree.add_file(files, FileInfo::fasta("b.fas")).unwrap();
        let events = record(&tree);

        let removed = tree.remove(a).unwrap();
        assert_eq!(removed.id, a);
        assert_eq!(tree.row_of(b), Some(0));
        assert_eq!(tree.remove(a).unwrap_err(), StoreError::UnknownItem(a));

        let events = events.lock();
        assert_eq!(events[0].0, "about_remove");
        assert_eq!(events[1].0, "removed");
        assert_eq!(events[1].1.range, RowRange::single(0));
    }

    #[test]
    fn test_remove_group_drops_descendants() {
        let tree = FileTree::new();
        let files = tree.add_group(None, "Files").unwrap();
        let a = tree.add_file(files, FileInfo::fasta("a.fas")).unwrap();

        tree.remove(files).unwrap();
        assert!(!tree.contains(a));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_refresh_is_data_change() {
        let tree = FileTree::new();
        let files = tree.add_group(None, "Files").unwrap();
        let a = tree.add_file(files, FileInfo::fasta("a.fas")).unwrap();
        let events = record(&tree);

        tree.refresh(a, FileInfo::fasta("a.fas").with_size(120)).unwrap();

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "changed");
        assert_eq!(events[0].1.kind, ChangeKind::Changed);
        assert_eq!(tree.item(a).unwrap().info().unwrap().size, 120);
        assert_eq!(
            tree.refresh(files, FileInfo::fasta("x.fas")).unwrap_err(),
            StoreError::NotAFile(files)
        );
    }

    #[test]
    fn test_clear_resets() {
        let tree = FileTree::new();
        let files = tree.add_group(None, "Files").unwrap();
        tree.add_file(files, FileInfo::fasta("a.fas")).unwrap();

        let resets = Arc::new(Mutex::new(0));
        let r = resets.clone();
        tree.signals().model_reset.connect(move |_| *r.lock() += 1);

        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(*resets.lock(), 1);
    }
}
