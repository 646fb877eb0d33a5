//! Error handling and edge case tests.

use snapdiff::{
    BlockCollector, BlockId, ChainConfig, DiffChain, DiffError, DiffNode, FileAttributes,
    FileEntry, InodeId, SnapshotId,
};

fn attrs() -> FileAttributes {
    FileAttributes::new("hdfs", "supergroup", 0o644)
}

// --- Construction ---

#[test]
fn test_node_requires_snapshot() {
    let result = DiffNode::try_new(None, Some(attrs()));
    assert!(matches!(result, Err(DiffError::MissingSnapshot)));
}

// --- Ordering ---

#[test]
fn test_snapshot_before_tail_rejected() {
    let mut file = FileEntry::new(InodeId(1), attrs());
    file.take_snapshot(SnapshotId(5)).unwrap();

    let result = file.take_snapshot(SnapshotId(3));
    assert!(matches!(
        result,
        Err(DiffError::OutOfOrder {
            tail: SnapshotId(5),
            got: SnapshotId(3)
        })
    ));

    // Mutating against a stale snapshot is refused before anything changes.
    let result = file.add_block(Some(SnapshotId(4)), BlockId(1));
    assert!(matches!(result, Err(DiffError::OutOfOrder { .. })));
    assert!(file.attributes().blocks.is_empty());
}

#[test]
fn test_retaking_latest_snapshot_is_noop() {
    let mut file = FileEntry::new(InodeId(1), attrs());
    file.take_snapshot(SnapshotId(1)).unwrap();
    file.take_snapshot(SnapshotId(1)).unwrap();
    assert_eq!(file.diffs().len(), 1);
}

#[test]
fn test_chain_full() {
    let mut file = FileEntry::with_config(InodeId(1), attrs(), ChainConfig { max_len: 1 });
    file.take_snapshot(SnapshotId(1)).unwrap();

    let result = file.add_block(Some(SnapshotId(2)), BlockId(1));
    assert!(matches!(result, Err(DiffError::ChainFull(1))));
    assert!(file.attributes().blocks.is_empty());
}

// --- Merge ---

#[test]
fn test_merge_not_adjacent() {
    let live = attrs();
    let earlier = DiffNode::with_state(SnapshotId(4), attrs());
    let later = DiffNode::with_state(SnapshotId(4), attrs());

    let mut collector = BlockCollector::new();
    let result = earlier.merge_with_successor(later, &[], &live, &mut collector);
    assert!(matches!(result, Err(DiffError::NotAdjacent { .. })));
    assert!(collector.is_empty());
}

// --- Deletion ---

#[test]
fn test_delete_from_empty_chain() {
    let live = attrs();
    let mut chain = DiffChain::<FileAttributes>::new();
    let mut collector = BlockCollector::new();

    let result = chain.delete_snapshot(SnapshotId(1), None, &live, &mut collector);
    assert!(matches!(result, Err(DiffError::SnapshotNotFound(SnapshotId(1)))));
}

#[test]
fn test_delete_twice_leaves_entry_alone() {
    let mut file = FileEntry::new(InodeId(1), attrs());
    file.take_snapshot(SnapshotId(1)).unwrap();
    file.take_snapshot(SnapshotId(2)).unwrap();

    let mut collector = BlockCollector::new();
    file.delete_snapshot(SnapshotId(2), Some(SnapshotId(1)), &mut collector)
        .unwrap();
    file.delete_snapshot(SnapshotId(2), Some(SnapshotId(1)), &mut collector)
        .unwrap();

    assert_eq!(file.diffs().snapshots(), vec![SnapshotId(1)]);
    assert!(collector.is_empty());

    // The chain itself still reports the missing diff.
    let result = DiffChain::<FileAttributes>::new().delete_snapshot(
        SnapshotId(2),
        None,
        file.attributes(),
        &mut collector,
    );
    assert!(matches!(result, Err(DiffError::SnapshotNotFound(SnapshotId(2)))));
}

#[test]
fn test_delete_with_wrong_prior() {
    let mut file = FileEntry::new(InodeId(1), attrs());
    file.take_snapshot(SnapshotId(1)).unwrap();
    file.take_snapshot(SnapshotId(3)).unwrap();

    let mut collector = BlockCollector::new();
    let result = file.delete_snapshot(SnapshotId(3), None, &mut collector);
    assert!(matches!(
        result,
        Err(DiffError::PriorSkipsDiff {
            snapshot: SnapshotId(3),
            previous: SnapshotId(1)
        })
    ));

    let result = file.delete_snapshot(SnapshotId(3), Some(SnapshotId(5)), &mut collector);
    assert!(matches!(result, Err(DiffError::PriorNotEarlier { .. })));
    assert_eq!(file.diffs().snapshots(), vec![SnapshotId(1), SnapshotId(3)]);
}

// --- Images ---

#[test]
fn test_decode_garbage() {
    let result = snapdiff::image::decode::<FileAttributes>(b"not an image at all");
    assert!(matches!(result, Err(DiffError::InvalidFormat(_))));
}

#[test]
fn test_error_messages() {
    let err = DiffError::OutOfOrder {
        tail: SnapshotId(5),
        got: SnapshotId(3),
    };
    assert_eq!(err.to_string(), "Snapshot s3 is not after the chain tail s5");
    assert_eq!(
        DiffError::SnapshotNotFound(SnapshotId(2)).to_string(),
        "Snapshot not found in chain: s2"
    );
}
