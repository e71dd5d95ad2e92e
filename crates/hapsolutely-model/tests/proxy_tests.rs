//! Index proxies over a live file tree.

use std::sync::Arc;
use std::thread;

use hapsolutely_model::{
    Alternative, FileInfo, FileTree, IndexProxy, IndexProxyBuilder, ItemStore, OutwardChange,
    ResolvedRow, SharedResultSlot, SyntheticRow,
};
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A consumer that keeps a copy of the proxy's row labels using only the
/// proxy's notifications.
fn mirror(proxy: &Arc<IndexProxy<FileTree>>) -> Arc<Mutex<Vec<String>>> {
    let rows: Vec<String> = (0..proxy.row_count())
        .map(|row| proxy.display(row).unwrap())
        .collect();
    let rows = Arc::new(Mutex::new(rows));
    let signals = proxy.signals();

    let weak = Arc::downgrade(proxy);
    let r = rows.clone();
    signals.rows_inserted.connect(move |change: &OutwardChange| {
        let Some(proxy) = weak.upgrade() else { return };
        let mut rows = r.lock();
        for row in change.range.first..=change.range.last {
            rows.insert(row, proxy.display(row).unwrap());
        }
    });
    let r = rows.clone();
    signals.rows_removed.connect(move |change: &OutwardChange| {
        r.lock().drain(change.range.first..=change.range.last);
    });
    let weak = Arc::downgrade(proxy);
    let r = rows.clone();
    signals.data_changed.connect(move |change: &OutwardChange| {
        let Some(proxy) = weak.upgrade() else { return };
        let mut rows = r.lock();
        for row in change.range.first..=change.range.last {
            rows[row] = proxy.display(row).unwrap();
        }
    });
    rows
}

fn labels(proxy: &IndexProxy<FileTree>) -> Vec<String> {
    (0..proxy.row_count())
        .map(|row| proxy.display(row).unwrap())
        .collect()
}

#[test]
fn test_mirror_follows_store_and_shared_result() {
    init_tracing();
    let tree = Arc::new(FileTree::new());
    let files = tree.add_group(None, "Sequence files").unwrap();
    let results = tree.add_group(None, "Phased results").unwrap();
    let slot = SharedResultSlot::new();
    let proxy = IndexProxyBuilder::new(tree.clone(), files)
        .shared_result(&slot)
        .build()
        .unwrap();
    let rows = mirror(&proxy);

    let a = proxy.add_file(FileInfo::fasta("a.fas")).unwrap();
    assert_eq!(a, 1);
    let shared = tree
        .add_file(results, FileInfo::fasta("phased.fas"))
        .unwrap();
    slot.set(Some(shared));
    proxy.add_file(FileInfo::fasta("b.fas")).unwrap();
    let first = tree.child_at(Some(files), 0).unwrap();
    tree.remove(first).unwrap();
    slot.clear();
    proxy.add_file(FileInfo::fasta("c.fas")).unwrap();

    assert_eq!(*rows.lock(), labels(&proxy));
    assert_eq!(*rows.lock(), vec!["---", "b.fas", "c.fas"]);
}

#[test]
fn test_slot_shared_by_several_proxies() {
    let tree = Arc::new(FileTree::new());
    let sequences = tree.add_group(None, "Sequence files").unwrap();
    let partitions = tree.add_group(None, "Partition files").unwrap();
    let results = tree.add_group(None, "Phased results").unwrap();
    tree.add_file(sequences, FileInfo::fasta("a.fas")).unwrap();

    let slot = SharedResultSlot::new();
    let first = IndexProxyBuilder::new(tree.clone(), sequences)
        .shared_result(&slot)
        .build()
        .unwrap();
    let second = IndexProxyBuilder::new(tree.clone(), partitions)
        .shared_result(&slot)
        .build()
        .unwrap();
    let plain = IndexProxy::builder(tree.clone(), sequences).build().unwrap();
    assert_eq!(slot.subscriber_count(), 2);

    let shared = tree
        .add_file(results, FileInfo::fasta("phased.fas"))
        .unwrap();
    slot.set(Some(shared));
    assert_eq!(first.extra_rows(), 2);
    assert_eq!(second.extra_rows(), 2);
    assert_eq!(plain.extra_rows(), 1);

    match second.resolve(0).unwrap() {
        ResolvedRow::Synthetic(SyntheticRow::SharedResult(item)) => {
            assert_eq!(item.item.id, shared);
        }
        other => panic!("unexpected row: {other:?}"),
    }

    drop(second);
    assert_eq!(slot.subscriber_count(), 1);
    slot.clear();
    assert_eq!(first.extra_rows(), 1);
}

#[test]
fn test_proxy_built_after_result_exists() {
    let tree = Arc::new(FileTree::new());
    let files = tree.add_group(None, "Sequence files").unwrap();
    let results = tree.add_group(None, "Phased results").unwrap();
    let shared = tree
        .add_file(results, FileInfo::fasta("phased.fas"))
        .unwrap();
    let slot = SharedResultSlot::new();
    slot.set(Some(shared));

    let proxy = IndexProxyBuilder::new(tree.clone(), files)
        .shared_result(&slot)
        .build()
        .unwrap();
    assert_eq!(proxy.extra_rows(), 2);
    assert_eq!(proxy.default_index(), 1);
    assert_eq!(
        labels(&proxy),
        vec!["Previously phased sequences", "---"]
    );
}

#[test]
fn test_store_rows_round_trip_under_every_policy() {
    let tree = Arc::new(FileTree::new());
    let files = tree.add_group(None, "Tree files").unwrap();
    let results = tree.add_group(None, "Phased results").unwrap();
    for name in ["a.tre", "b.tre", "c.tre"] {
        tree.add_file(files, FileInfo::fasta(name)).unwrap();
    }
    let shared = tree.add_file(results, FileInfo::fasta("p.fas")).unwrap();
    let slot = SharedResultSlot::new();
    slot.set(Some(shared));

    let placeholder = IndexProxy::builder(tree.clone(), files).build().unwrap();
    let observing = IndexProxyBuilder::new(tree.clone(), files)
        .shared_result(&slot)
        .build()
        .unwrap();
    let generated = IndexProxyBuilder::new(tree.clone(), files)
        .alternatives(vec![
            Alternative::new("nj", "neighbor joining"),
            Alternative::new("mp", "maximum parsimony"),
        ])
        .build()
        .unwrap();

    let check = |row_count: usize, resolve: &dyn Fn(usize) -> Option<usize>| {
        for row in 0..row_count {
            if let Some(back) = resolve(row) {
                assert_eq!(back, row);
            }
        }
    };
    check(placeholder.row_count(), &|row| match placeholder.resolve(row).unwrap() {
        ResolvedRow::StoreItem(item) => Some(placeholder.translate_to_outward(&item.index).unwrap()),
        ResolvedRow::Synthetic(_) => None,
    });
    check(observing.row_count(), &|row| match observing.resolve(row).unwrap() {
        ResolvedRow::StoreItem(item) => Some(observing.translate_to_outward(&item.index).unwrap()),
        ResolvedRow::Synthetic(_) => None,
    });
    check(generated.row_count(), &|row| match generated.resolve(row).unwrap() {
        ResolvedRow::StoreItem(item) => Some(generated.translate_to_outward(&item.index).unwrap()),
        ResolvedRow::Synthetic(_) => None,
    });
    assert_eq!(generated.row_count(), 6);
}

#[test]
fn test_concurrent_toggles_and_inserts_stay_consistent() {
    let tree = Arc::new(FileTree::new());
    let files = tree.add_group(None, "Sequence files").unwrap();
    let results = tree.add_group(None, "Phased results").unwrap();
    let shared = tree.add_file(results, FileInfo::fasta("p.fas")).unwrap();
    let slot = SharedResultSlot::new();
    let proxy = IndexProxyBuilder::new(tree.clone(), files)
        .shared_result(&slot)
        .build()
        .unwrap();

    let toggler = {
        let slot = slot.clone();
        thread::spawn(move || {
            for n in 0..50 {
                slot.set((n % 2 == 0).then_some(shared));
            }
        })
    };
    let loader = {
        let proxy = proxy.clone();
        thread::spawn(move || {
            for n in 0..20 {
                proxy.add_file(FileInfo::fasta(format!("{n}.fas"))).unwrap();
            }
        })
    };
    toggler.join().unwrap();
    loader.join().unwrap();

    assert_eq!(proxy.extra_rows(), 1);
    assert_eq!(proxy.row_count(), 21);
    for row in 1..proxy.row_count() {
        let index = proxy.resolve(row).unwrap().store_index().unwrap();
        assert_eq!(proxy.translate_to_outward(&index).unwrap(), row);
    }
}
