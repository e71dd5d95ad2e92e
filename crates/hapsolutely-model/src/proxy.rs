//! Synthetic-augmented index proxy.
//!
//! An [`IndexProxy`] presents the direct children of one store item (its
//! root) through an outward row space that starts with a few synthetic rows:
//!
//! ```text
//! outward row   0            extra_rows - 1 | extra_rows      ...
//!               [ synthetic rows ...        ] [ store rows ...     ]
//! store row                                   | 0                ...
//! ```
//!
//! The proxy never owns items. It reads the store through [`ItemStore`],
//! listens to the store's signals and re-emits every change affecting its
//! root in outward coordinates on its own [`ModelSignals`].
//!
//! # Shared result transitions
//!
//! With [`SyntheticRowPolicy::PlaceholderWithSharedResult`], the number of
//! synthetic rows toggles between 1 and 2 as the shared result appears and
//! disappears. Each toggle is emitted as a single-row insert or removal at
//! row 0, never as a data change. Every toggle is recorded with its stamp,
//! and store notifications are shifted by the offset that was in effect
//! when the store mutation happened.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use hapsolutely_model::{FileInfo, FileTree, IndexProxyBuilder, ItemStore, SharedResultSlot};
//!
//! let tree = Arc::new(FileTree::new());
//! let files = tree.add_group(None, "Sequence files").unwrap();
//! let slot = SharedResultSlot::new();
//!
//! let proxy = IndexProxyBuilder::new(tree.clone(), files)
//!     .shared_result(&slot)
//!     .build()
//!     .unwrap();
//! let row = proxy.add_file(FileInfo::fasta("sample.fas")).unwrap();
//! assert_eq!(row, 1);
//! assert_eq!(proxy.default_index(), 0);
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use hapsolutely_core::logging::targets;
use hapsolutely_core::{ConnectionId, ModelSignals, Settings, Stamp, next_stamp};
use parking_lot::{ReentrantMutex, RwLock};

use crate::error::{ProxyError, Result};
use crate::index::{ChangeKind, ChangePhase, OutwardChange, RowRange, StoreChange, StoreIndex};
use crate::item::{FileInfo, Item, ItemId};
use crate::policy::{Alternative, SyntheticKind, SyntheticRowPolicy};
use crate::shared::SharedResultSlot;
use crate::store::ItemStore;

// ============================================================================
// Resolved rows
// ============================================================================

/// A store item behind an outward row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreItem {
    /// The item's store position at resolution time.
    pub index: StoreIndex,
    /// A copy of the item.
    pub item: Item,
}

/// A row with no store item of its own at its outward position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntheticRow<M = ()> {
    Placeholder,
    /// The shared result, which lives elsewhere in the store.
    SharedResult(StoreItem),
    GeneratedAlternative { position: usize, method: M },
}

impl<M> SyntheticRow<M> {
    pub fn kind(&self) -> SyntheticKind {
        match self {
            Self::Placeholder => SyntheticKind::Placeholder,
            Self::SharedResult(_) => SyntheticKind::SharedResult,
            Self::GeneratedAlternative { position, .. } => {
                SyntheticKind::GeneratedAlternative(*position)
            }
        }
    }
}

/// What an outward row stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRow<M = ()> {
    Synthetic(SyntheticRow<M>),
    StoreItem(StoreItem),
}

impl<M> ResolvedRow<M> {
    /// The store item backing this row: the item itself for store rows,
    /// the shared result for the shared result row.
    pub fn store_item(&self) -> Option<&StoreItem> {
        match self {
            Self::StoreItem(item) | Self::Synthetic(SyntheticRow::SharedResult(item)) => Some(item),
            Self::Synthetic(_) => None,
        }
    }

    /// Store position of the backing item, if any.
    pub fn store_index(&self) -> Option<StoreIndex> {
        self.store_item().map(|item| item.index)
    }

    /// File metadata of the backing item, if it is a file.
    pub fn file_info(&self) -> Option<&FileInfo> {
        self.store_item().and_then(|item| item.item.info())
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Synthetic(SyntheticRow::Placeholder))
    }
}

/// Result of [`IndexProxy::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<M = ()> {
    /// The selected outward row.
    pub row: usize,
    pub resolved: ResolvedRow<M>,
    /// The requested row was invalid and the default row was selected
    /// instead.
    pub corrected: bool,
}

/// An owned copy of a selection, safe to hand to batch processing while the
/// proxy keeps changing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSnapshot<M = ()> {
    pub row: usize,
    pub resolved: ResolvedRow<M>,
    /// When the snapshot was taken.
    pub taken: Stamp,
}

// ============================================================================
// Internal state
// ============================================================================

/// Display texts of the synthetic rows.
#[derive(Debug, Clone)]
struct Labels {
    placeholder: String,
    shared_result: String,
    alternative_prefix: String,
}

impl From<&Settings> for Labels {
    fn from(settings: &Settings) -> Self {
        Self {
            placeholder: settings.placeholder_label.clone(),
            shared_result: settings.shared_result_label.clone(),
            alternative_prefix: settings.alternative_label_prefix.clone(),
        }
    }
}

/// Synthetic row counts, keyed by the stamp from which each was in effect.
///
/// Always holds at least one entry; entries are sorted by stamp. Entries
/// still needed by a structural store change whose done notification has
/// not arrived yet are never pruned.
#[derive(Debug)]
struct OffsetHistory {
    entries: Vec<(Stamp, usize)>,
    /// Stamps of store changes seen pending but not done, with counts.
    in_flight: BTreeMap<Stamp, usize>,
}

impl OffsetHistory {
    fn new(extra_rows: usize) -> Self {
        Self {
            entries: vec![(Stamp::ORIGIN, extra_rows)],
            in_flight: BTreeMap::new(),
        }
    }

    fn open(&mut self, stamp: Stamp) {
        *self.in_flight.entry(stamp).or_default() += 1;
    }

    /// Closes the change at `stamp` and prunes what no open change needs.
    fn settle(&mut self, stamp: Stamp) {
        if let Some(count) = self.in_flight.get_mut(&stamp) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(&stamp);
            }
        }
        let horizon = self
            .in_flight
            .keys()
            .next()
            .map_or(stamp, |&oldest| oldest.min(stamp));
        self.prune_before(horizon);
    }

    fn record(&mut self, stamp: Stamp, extra_rows: usize) {
        let at = self.entries.partition_point(|&(s, _)| s <= stamp);
        self.entries.insert(at, (stamp, extra_rows));
    }

    /// The synthetic row count in effect at `stamp`.
    fn offset_at(&self, stamp: Stamp) -> usize {
        let at = self.entries.partition_point(|&(s, _)| s <= stamp);
        self.entries[..at]
            .last()
            .or(self.entries.first())
            .map_or(0, |&(_, extra_rows)| extra_rows)
    }

    /// Drops entries superseded before `stamp`, keeping the one in effect.
    fn prune_before(&mut self, stamp: Stamp) {
        let at = self.entries.partition_point(|&(s, _)| s <= stamp);
        if at > 1 {
            self.entries.drain(..at - 1);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

struct ProxyState<M> {
    policy: SyntheticRowPolicy<M>,
    /// The shared result, tracked only when the policy observes it.
    shared: Option<ItemId>,
    history: OffsetHistory,
}

impl<M> ProxyState<M> {
    fn extra_rows(&self) -> usize {
        self.policy.extra_rows(self.shared.is_some())
    }
}

/// The proxy's connections to its store's signals.
struct StoreConnections {
    about_to_insert: ConnectionId,
    inserted: ConnectionId,
    about_to_remove: ConnectionId,
    removed: ConnectionId,
    changed: ConnectionId,
    about_to_reset: ConnectionId,
    reset: ConnectionId,
}

impl StoreConnections {
    fn connect<S, M>(signals: &ModelSignals<StoreChange>, proxy: &Weak<IndexProxy<S, M>>) -> Self
    where
        S: ItemStore + 'static,
        M: Clone + Send + Sync + 'static,
    {
        let forward = |proxy: &Weak<IndexProxy<S, M>>| {
            let proxy = proxy.clone();
            move |change: &StoreChange| {
                if let Some(proxy) = proxy.upgrade() {
                    proxy.on_store_changed(change);
                }
            }
        };

        let about_to_reset = {
            let proxy = proxy.clone();
            signals.model_about_to_reset.connect(move |_| {
                if let Some(proxy) = proxy.upgrade() {
                    proxy.on_store_about_to_reset();
                }
            })
        };
        let reset = {
            let proxy = proxy.clone();
            signals.model_reset.connect(move |_| {
                if let Some(proxy) = proxy.upgrade() {
                    proxy.on_store_reset();
                }
            })
        };

        Self {
            about_to_insert: signals.rows_about_to_be_inserted.connect(forward(proxy)),
            inserted: signals.rows_inserted.connect(forward(proxy)),
            about_to_remove: signals.rows_about_to_be_removed.connect(forward(proxy)),
            removed: signals.rows_removed.connect(forward(proxy)),
            changed: signals.data_changed.connect(forward(proxy)),
            about_to_reset,
            reset,
        }
    }

    fn disconnect(&self, signals: &ModelSignals<StoreChange>) {
        signals.rows_about_to_be_inserted.disconnect(self.about_to_insert);
        signals.rows_inserted.disconnect(self.inserted);
        signals.rows_about_to_be_removed.disconnect(self.about_to_remove);
        signals.rows_removed.disconnect(self.removed);
        signals.data_changed.disconnect(self.changed);
        signals.model_about_to_reset.disconnect(self.about_to_reset);
        signals.model_reset.disconnect(self.reset);
    }
}

// ============================================================================
// IndexProxy
// ============================================================================

/// An index-space adapter over the children of one store item.
///
/// Built with [`IndexProxyBuilder`]. The proxy is always handled through an
/// `Arc`; its store and shared-result subscriptions hold only weak
/// references to it and are removed when it is dropped.
pub struct IndexProxy<S: ItemStore, M = ()> {
    store: Arc<S>,
    root: ItemId,
    state: RwLock<ProxyState<M>>,
    /// Held while a synthetic row transition or a store event is being
    /// applied and re-emitted, so consumers never observe the two
    /// interleaved.
    transition: ReentrantMutex<()>,
    slot: Option<Weak<SharedResultSlot>>,
    slot_connection: Option<ConnectionId>,
    store_connections: StoreConnections,
    labels: Labels,
    signals: ModelSignals<OutwardChange>,
}

impl<S: ItemStore + 'static> IndexProxy<S, ()> {
    /// Starts building a proxy over the children of `root`.
    pub fn builder(store: Arc<S>, root: ItemId) -> IndexProxyBuilder<S, ()> {
        IndexProxyBuilder::new(store, root)
    }
}

impl<S: ItemStore + 'static, M: Clone + Send + Sync + 'static> IndexProxy<S, M> {
    /// The store this proxy reads.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The item whose children this proxy presents.
    pub fn root(&self) -> ItemId {
        self.root
    }

    /// Outward change notifications.
    pub fn signals(&self) -> &ModelSignals<OutwardChange> {
        &self.signals
    }

    /// A copy of the active policy.
    pub fn policy(&self) -> SyntheticRowPolicy<M> {
        self.state.read().policy.clone()
    }

    /// The shared result currently shown at row 0, if any.
    pub fn shared_result(&self) -> Option<ItemId> {
        self.state.read().shared
    }

    /// Number of synthetic rows currently preceding the store rows.
    pub fn extra_rows(&self) -> usize {
        self.state.read().extra_rows()
    }

    /// Total number of outward rows.
    pub fn row_count(&self) -> usize {
        self.extra_rows() + self.store.child_count(Some(self.root))
    }

    /// The row a newly constructed or reset consumer should select.
    pub fn default_index(&self) -> usize {
        let state = self.state.read();
        state.policy.default_row(state.shared.is_some())
    }

    /// Resolves an outward row to a synthetic row or a store item.
    pub fn resolve(&self, row: usize) -> Result<ResolvedRow<M>> {
        let state = self.state.read();
        let shared_present = state.shared.is_some();
        let extra_rows = state.extra_rows();
        let row_count = extra_rows + self.store.child_count(Some(self.root));
        let out_of_range = ProxyError::OutOfRange {
            row: row as isize,
            row_count,
        };
        if row >= row_count {
            return Err(out_of_range);
        }

        let resolved = match state.policy.kind_at(row, shared_present) {
            Some(SyntheticKind::Placeholder) => ResolvedRow::Synthetic(SyntheticRow::Placeholder),
            Some(SyntheticKind::SharedResult) => {
                let id = state.shared.ok_or(out_of_range)?;
                let shared = self.store_item(id)?;
                ResolvedRow::Synthetic(SyntheticRow::SharedResult(shared))
            }
            Some(SyntheticKind::GeneratedAlternative(position)) => {
                let alternative = state
                    .policy
                    .alternatives()
                    .get(position)
                    .ok_or(out_of_range)?;
                if !alternative.enabled {
                    return Err(ProxyError::DisabledAlternative { row });
                }
                ResolvedRow::Synthetic(SyntheticRow::GeneratedAlternative {
                    position,
                    method: alternative.method.clone(),
                })
            }
            None => {
                let store_row = row - extra_rows;
                let id = self
                    .store
                    .child_at(Some(self.root), store_row)
                    .ok_or(out_of_range)?;
                let item = self.store.item(id).ok_or(ProxyError::UnknownItem(id))?;
                ResolvedRow::StoreItem(StoreItem {
                    index: StoreIndex::new(id, store_row, Some(self.root)),
                    item,
                })
            }
        };
        Ok(resolved)
    }

    /// The current outward row of a store position.
    ///
    /// Direct children of the root map to `row + extra_rows`. The shared
    /// result maps to row 0 while it is shown. Anything else is
    /// [`ProxyError::NotVisible`].
    pub fn translate_to_outward(&self, index: &StoreIndex) -> Result<usize> {
        let id = index.id();
        let state = self.state.read();
        if self.store.parent_of(id) == Some(self.root) {
            let row = self.store.row_of(id).ok_or(ProxyError::UnknownItem(id))?;
            return Ok(row + state.extra_rows());
        }
        if state.shared == Some(id) {
            return Ok(0);
        }
        Err(ProxyError::NotVisible(id))
    }

    /// Resolves `requested`, falling back to the default row if it is
    /// invalid.
    pub fn select(&self, requested: isize) -> Selection<M> {
        let attempt = usize::try_from(requested)
            .map_err(|_| ProxyError::OutOfRange {
                row: requested,
                row_count: self.row_count(),
            })
            .and_then(|row| self.resolve(row).map(|resolved| (row, resolved)));

        match attempt {
            Ok((row, resolved)) => Selection {
                row,
                resolved,
                corrected: false,
            },
            Err(error) => {
                let row = self.default_index();
                tracing::warn!(
                    target: targets::PROXY,
                    requested,
                    fallback = row,
                    %error,
                    "invalid selection corrected"
                );
                let resolved = self
                    .resolve(row)
                    .unwrap_or(ResolvedRow::Synthetic(SyntheticRow::Placeholder));
                Selection {
                    row,
                    resolved,
                    corrected: true,
                }
            }
        }
    }

    /// Whether `row` can be selected as is.
    pub fn is_selectable(&self, row: usize) -> bool {
        self.resolve(row).is_ok()
    }

    /// Display text of an outward row. Disabled alternatives still have one.
    pub fn display(&self, row: usize) -> Result<String> {
        let state = self.state.read();
        let extra_rows = state.extra_rows();
        let out_of_range = || ProxyError::OutOfRange {
            row: row as isize,
            row_count: extra_rows + self.store.child_count(Some(self.root)),
        };

        match state.policy.kind_at(row, state.shared.is_some()) {
            Some(SyntheticKind::Placeholder) => Ok(self.labels.placeholder.clone()),
            Some(SyntheticKind::SharedResult) => Ok(self.labels.shared_result.clone()),
            Some(SyntheticKind::GeneratedAlternative(position)) => state
                .policy
                .alternatives()
                .get(position)
                .map(|alternative| {
                    format!("{} {}", self.labels.alternative_prefix, alternative.description)
                })
                .ok_or_else(out_of_range),
            None => {
                let id = self
                    .store
                    .child_at(Some(self.root), row - extra_rows)
                    .ok_or_else(out_of_range)?;
                self.store
                    .item(id)
                    .map(|item| item.name)
                    .ok_or(ProxyError::UnknownItem(id))
            }
        }
    }

    /// Resolves `row` into an owned snapshot.
    pub fn snapshot(&self, row: usize) -> Result<SelectionSnapshot<M>> {
        let resolved = self.resolve(row)?;
        Ok(SelectionSnapshot {
            row,
            resolved,
            taken: next_stamp(),
        })
    }

    /// Adds a file under the root and returns its outward row.
    pub fn add_file(&self, info: FileInfo) -> Result<usize> {
        let id = self.store.add_file(self.root, info)?;
        let index = self.store.index_of(id).ok_or(ProxyError::UnknownItem(id))?;
        self.translate_to_outward(&index)
    }

    /// Enables or disables the alternative at `position`.
    ///
    /// The alternative keeps its row; consumers see a data change.
    pub fn set_alternative_enabled(&self, position: usize, enabled: bool) -> Result<()> {
        let _transition = self.transition.lock();
        let changed = {
            let mut state = self.state.write();
            let row_count = state.extra_rows() + self.store.child_count(Some(self.root));
            let alternative =
                state
                    .policy
                    .alternative_mut(position)
                    .ok_or(ProxyError::OutOfRange {
                        row: position as isize,
                        row_count,
                    })?;
            let changed = alternative.enabled != enabled;
            alternative.enabled = enabled;
            changed
        };

        if changed {
            tracing::debug!(target: targets::PROXY, position, enabled, "alternative toggled");
            self.signals.data_changed.emit(OutwardChange {
                kind: ChangeKind::Changed,
                phase: ChangePhase::Done,
                range: RowRange::single(position),
                stamp: next_stamp(),
            });
        }
        Ok(())
    }

    /// Applies a shared result change.
    ///
    /// Appearance and disappearance insert or remove outward row 0;
    /// replacing one result by another is a data change of row 0. Policies
    /// that do not show the shared result ignore this.
    pub fn on_shared_result_changed(&self, result: Option<ItemId>) {
        self.apply_shared_result(result, next_stamp());
    }

    /// Re-emits a store change in outward coordinates.
    ///
    /// Changes to children of the root are shifted by the synthetic row
    /// count in effect at the change's stamp. A data change of the shared
    /// result becomes a data change of row 0. Returns the emitted change,
    /// or `None` if the change is not visible through this proxy.
    pub fn on_store_changed(&self, change: &StoreChange) -> Option<OutwardChange> {
        let _transition = self.transition.lock();
        let outward = {
            let mut state = self.state.write();
            let outward = if change.parent == Some(self.root) {
                let offset = state.history.offset_at(change.stamp);
                Some(OutwardChange {
                    kind: change.kind,
                    phase: change.phase,
                    range: change.range.shifted(offset),
                    stamp: change.stamp,
                })
            } else if change.kind == ChangeKind::Changed && self.touches_shared(&state, change) {
                Some(OutwardChange {
                    kind: ChangeKind::Changed,
                    phase: ChangePhase::Done,
                    range: RowRange::single(0),
                    stamp: change.stamp,
                })
            } else {
                None
            };
            match change.phase {
                ChangePhase::Pending if change.kind != ChangeKind::Changed => {
                    state.history.open(change.stamp);
                }
                ChangePhase::Pending => {}
                ChangePhase::Done => state.history.settle(change.stamp),
            }
            outward
        }?;

        tracing::debug!(
            target: targets::PROXY,
            kind = ?outward.kind,
            phase = ?outward.phase,
            first = outward.range.first,
            last = outward.range.last,
            "store change re-emitted"
        );
        let signal = match (outward.kind, outward.phase) {
            (ChangeKind::Added, ChangePhase::Pending) => &self.signals.rows_about_to_be_inserted,
            (ChangeKind::Added, ChangePhase::Done) => &self.signals.rows_inserted,
            (ChangeKind::Removed, ChangePhase::Pending) => &self.signals.rows_about_to_be_removed,
            (ChangeKind::Removed, ChangePhase::Done) => &self.signals.rows_removed,
            (ChangeKind::Changed, _) => &self.signals.data_changed,
        };
        signal.emit(outward);
        Some(outward)
    }

    fn store_item(&self, id: ItemId) -> Result<StoreItem> {
        let item = self.store.item(id).ok_or(ProxyError::UnknownItem(id))?;
        let index = self.store.index_of(id).ok_or(ProxyError::UnknownItem(id))?;
        Ok(StoreItem { index, item })
    }

    fn touches_shared(&self, state: &ProxyState<M>, change: &StoreChange) -> bool {
        state.shared.is_some_and(|id| {
            self.store.parent_of(id) == change.parent
                && self
                    .store
                    .row_of(id)
                    .is_some_and(|row| change.range.contains(row))
        })
    }

    fn apply_shared_result(&self, result: Option<ItemId>, stamp: Stamp) {
        let _transition = self.transition.lock();
        let previous = {
            let state = self.state.read();
            if !state.policy.observes_shared_result() {
                return;
            }
            state.shared
        };

        let pending = OutwardChange {
            kind: ChangeKind::Added,
            phase: ChangePhase::Pending,
            range: RowRange::single(0),
            stamp,
        };
        match (previous, result) {
            (None, Some(id)) => {
                tracing::debug!(target: targets::PROXY, ?id, "shared result row inserted");
                self.signals.emit_rows_inserted(
                    pending,
                    pending.with_phase(ChangePhase::Done),
                    || self.set_shared(Some(id), stamp),
                );
            }
            (Some(id), None) => {
                tracing::debug!(target: targets::PROXY, ?id, "shared result row removed");
                let pending = OutwardChange {
                    kind: ChangeKind::Removed,
                    ..pending
                };
                self.signals.emit_rows_removed(
                    pending,
                    pending.with_phase(ChangePhase::Done),
                    || self.set_shared(None, stamp),
                );
            }
            (Some(old), Some(new)) if old != new => {
                self.state.write().shared = Some(new);
                self.signals.data_changed.emit(OutwardChange {
                    kind: ChangeKind::Changed,
                    phase: ChangePhase::Done,
                    ..pending
                });
            }
            _ => {}
        }
    }

    fn set_shared(&self, shared: Option<ItemId>, stamp: Stamp) {
        let mut state = self.state.write();
        state.shared = shared;
        let extra_rows = state.extra_rows();
        state.history.record(stamp, extra_rows);
    }

    fn on_store_about_to_reset(&self) {
        let _transition = self.transition.lock();
        self.signals.model_about_to_reset.emit(());
    }

    fn on_store_reset(&self) {
        let _transition = self.transition.lock();
        {
            let mut state = self.state.write();
            let extra_rows = state.extra_rows();
            state.history = OffsetHistory::new(extra_rows);
        }
        tracing::debug!(target: targets::PROXY, "store reset forwarded");
        self.signals.model_reset.emit(());
    }

    #[cfg(test)]
    fn history_len(&self) -> usize {
        self.state.read().history.len()
    }
}

impl<S: ItemStore, M> Drop for IndexProxy<S, M> {
    fn drop(&mut self) {
        self.store_connections.disconnect(self.store.signals());
        if let (Some(slot), Some(id)) = (
            self.slot.as_ref().and_then(Weak::upgrade),
            self.slot_connection,
        ) {
            slot.unsubscribe(id);
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`IndexProxy`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use hapsolutely_model::{Alternative, FileTree, IndexProxyBuilder};
///
/// let tree = Arc::new(FileTree::new());
/// let trees = tree.add_group(None, "Tree files").unwrap();
///
/// let proxy = IndexProxyBuilder::new(tree, trees)
///     .alternatives(vec![Alternative::new("nj", "neighbor joining")])
///     .build()
///     .unwrap();
/// assert_eq!(proxy.display(0).unwrap(), "Generate from input sequences using neighbor joining");
/// ```
pub struct IndexProxyBuilder<S: ItemStore, M = ()> {
    store: Arc<S>,
    root: ItemId,
    policy: SyntheticRowPolicy<M>,
    slot: Option<Arc<SharedResultSlot>>,
    labels: Labels,
}

impl<S: ItemStore + 'static> IndexProxyBuilder<S, ()> {
    /// Creates a builder for a placeholder-only proxy over `root`.
    pub fn new(store: Arc<S>, root: ItemId) -> Self {
        Self {
            store,
            root,
            policy: SyntheticRowPolicy::Placeholder,
            slot: None,
            labels: Labels::from(&Settings::default()),
        }
    }
}

impl<S: ItemStore + 'static, M> IndexProxyBuilder<S, M> {
    /// Shows `slot`'s result before the placeholder while one exists.
    pub fn shared_result(mut self, slot: &Arc<SharedResultSlot>) -> Self {
        self.policy = SyntheticRowPolicy::PlaceholderWithSharedResult;
        self.slot = Some(slot.clone());
        self
    }

    /// Shows fixed alternatives before the placeholder.
    pub fn alternatives<N>(self, alternatives: Vec<Alternative<N>>) -> IndexProxyBuilder<S, N> {
        IndexProxyBuilder {
            store: self.store,
            root: self.root,
            policy: SyntheticRowPolicy::GeneratedAlternatives(alternatives),
            slot: self.slot,
            labels: self.labels,
        }
    }

    /// Sets the policy directly.
    pub fn policy(mut self, policy: SyntheticRowPolicy<M>) -> Self {
        self.policy = policy;
        self
    }

    /// Takes the synthetic row labels from `settings`.
    pub fn settings(mut self, settings: &Settings) -> Self {
        self.labels = Labels::from(settings);
        self
    }
}

impl<S: ItemStore + 'static, M: Clone + Send + Sync + 'static> IndexProxyBuilder<S, M> {
    /// Builds the proxy and connects it to the store and shared result slot.
    pub fn build(self) -> Result<Arc<IndexProxy<S, M>>> {
        let Self {
            store,
            root,
            policy,
            slot,
            labels,
        } = self;
        if !store.contains(root) {
            return Err(ProxyError::UnknownItem(root));
        }

        let observed = slot.filter(|_| policy.observes_shared_result());
        let proxy = Arc::new_cyclic(|weak: &Weak<IndexProxy<S, M>>| {
            let store_connections = StoreConnections::connect(store.signals(), weak);
            let slot_connection = observed.as_ref().map(|slot| {
                let weak = weak.clone();
                slot.subscribe(move |change| {
                    if let Some(proxy) = weak.upgrade() {
                        proxy.apply_shared_result(change.current, change.stamp);
                    }
                })
            });
            // Read after subscribing so a concurrent write is never missed.
            let shared = observed.as_ref().and_then(|slot| slot.get());
            let history = OffsetHistory::new(policy.extra_rows(shared.is_some()));

            IndexProxy {
                store,
                root,
                state: RwLock::new(ProxyState {
                    policy,
                    shared,
                    history,
                }),
                transition: ReentrantMutex::new(()),
                slot: observed.as_ref().map(Arc::downgrade),
                slot_connection,
                store_connections,
                labels,
                signals: ModelSignals::new(),
            }
        });

        tracing::debug!(
            target: targets::PROXY,
            ?root,
            extra_rows = proxy.extra_rows(),
            "index proxy built"
        );
        Ok(proxy)
    }
}

static_assertions::assert_impl_all!(IndexProxy<crate::FileTree>: Send, Sync);
