//! A single node in a reverse-delta chain.

use crate::collector::BlockCollector;
use crate::error::{DiffError, Result};
use crate::state::{LiveEntry, SnapshotState};
use crate::types::SnapshotId;
use std::cmp::Ordering;

/// Owning link to the next (more recent) node.
pub(crate) type Link<S> = Option<Box<DiffNode<S>>>;

/// The difference of an entry between snapshot `snapshot` and the next
/// recorded point.
///
/// Nodes form a chain `d_1 -> d_2 -> ... -> d_n`, oldest first, and the
/// live entry is the implicit successor of `d_n`. The state as of `s_k` is
/// obtained by undoing `d_n`, then `d_{n-1}`, down to `d_k`; since each node
/// stores a full copy of the state when it stores anything, that reduces to
/// taking the first captured state at or after `d_k`.
#[derive(Debug)]
pub struct DiffNode<S> {
    snapshot: SnapshotId,

    /// State as of `snapshot`. `None` when nothing changed before the next
    /// recorded point.
    captured: Option<S>,

    next: Link<S>,
}

impl<S: SnapshotState> DiffNode<S> {
    /// Create an uncaptured node.
    pub fn new(snapshot: SnapshotId) -> Self {
        Self {
            snapshot,
            captured: None,
            next: None,
        }
    }

    /// Create a node that already holds its state.
    pub fn with_state(snapshot: SnapshotId, captured: S) -> Self {
        Self {
            snapshot,
            captured: Some(captured),
            next: None,
        }
    }

    /// Create a node from parts that may be missing.
    ///
    /// A node without a snapshot has no place in the order, so it is refused.
    pub fn try_new(snapshot: Option<SnapshotId>, captured: Option<S>) -> Result<Self> {
        let snapshot = snapshot.ok_or(DiffError::MissingSnapshot)?;
        Ok(Self {
            snapshot,
            captured,
            next: None,
        })
    }

    pub fn snapshot(&self) -> SnapshotId {
        self.snapshot
    }

    /// Compare this node with a snapshot by creation order.
    pub fn compare_to(&self, snapshot: SnapshotId) -> Ordering {
        self.snapshot.cmp(&snapshot)
    }

    /// Captured state, read-only.
    pub fn captured(&self) -> Option<&S> {
        self.captured.as_ref()
    }

    pub fn is_captured(&self) -> bool {
        self.captured.is_some()
    }

    /// The next more recent node, if any.
    pub fn next(&self) -> Option<&DiffNode<S>> {
        self.next.as_deref()
    }

    pub(crate) fn next_link_mut(&mut self) -> &mut Link<S> {
        &mut self.next
    }

    /// Capture the state before the live entry is first mutated.
    ///
    /// Write-once: if a state is already captured this does nothing.
    /// Otherwise `fallback` is adopted, or a fresh copy of the live entry is
    /// taken. Returns whether a state was captured by this call.
    pub fn ensure_captured<L: LiveEntry<S>>(&mut self, fallback: Option<S>, live: &L) -> bool {
        if self.captured.is_some() {
            return false;
        }

        let from_fallback = fallback.is_some();
        self.captured = Some(fallback.unwrap_or_else(|| live.snapshot_copy()));
        tracing::trace!(snapshot = %self.snapshot, from_fallback, "diff state captured");
        true
    }

    /// State of the entry as of this node's snapshot.
    ///
    /// Walks forward to the first captured state; past the tail the live
    /// state is the answer.
    pub fn resolve_state<'a, L: LiveEntry<S>>(&'a self, live: &'a L) -> &'a S {
        let mut node = self;
        loop {
            if let Some(state) = &node.captured {
                return state;
            }
            match &node.next {
                Some(next) => node = &**next,
                None => return live.current(),
            }
        }
    }

    /// Captured states after this node, followed by the live state.
    fn later_states<'a, L: LiveEntry<S>>(&'a self, live: &'a L) -> Vec<&'a S> {
        let mut states = Vec::new();
        let mut cursor = self.next.as_deref();
        while let Some(node) = cursor {
            states.extend(node.captured.as_ref());
            cursor = node.next.as_deref();
        }
        states.push(live.current());
        states
    }

    /// Fold `successor` into this node, removing the snapshot boundary
    /// between them.
    ///
    /// `successor` must already be detached from this node and belong to a
    /// later snapshot. The merged node keeps this node's snapshot, adopts the
    /// successor's state if this node has none, and links to whatever
    /// followed the successor. A state that ends up dropped is handed to
    /// [`SnapshotState::collect_released`] against `earlier` (captured states
    /// of retained nodes before this one), the merged state, everything
    /// after the pair, and the live state.
    pub fn merge_with_successor<L: LiveEntry<S>>(
        mut self,
        successor: DiffNode<S>,
        earlier: &[&S],
        live: &L,
        collector: &mut BlockCollector,
    ) -> Result<DiffNode<S>> {
        if self.next.is_some() || successor.snapshot <= self.snapshot {
            return Err(DiffError::NotAdjacent {
                earlier: self.snapshot,
                later: successor.snapshot,
            });
        }
        self.absorb(successor, earlier, live, collector);
        Ok(self)
    }

    /// The merge itself. Callers guarantee adjacency.
    pub(crate) fn absorb<L: LiveEntry<S>>(
        &mut self,
        mut successor: DiffNode<S>,
        earlier: &[&S],
        live: &L,
        collector: &mut BlockCollector,
    ) {
        let dropped = match successor.captured.take() {
            Some(state) if self.captured.is_none() => {
                self.captured = Some(state);
                None
            }
            other => other,
        };
        self.next = successor.next.take();

        if let Some(removed) = dropped {
            let mut survivors: Vec<&S> = earlier.to_vec();
            survivors.extend(self.captured.as_ref());
            survivors.extend(self.later_states(live));
            S::collect_released(&removed, &survivors, collector);
        }

        tracing::debug!(
            kept = %self.snapshot,
            removed = %successor.snapshot,
            captured = self.captured.is_some(),
            "merged diff with successor"
        );
    }

    /// Hand this node over to an older snapshot that has no diff of its own.
    ///
    /// The captured state is already that snapshot's state, so nothing is
    /// released. `snapshot` must lie between the previous node and this one.
    pub(crate) fn rekey(&mut self, snapshot: SnapshotId) {
        tracing::debug!(from = %self.snapshot, to = %snapshot, "diff handed to prior snapshot");
        self.snapshot = snapshot;
    }

    /// Drop the oldest node of a chain outright.
    ///
    /// Its history is superseded by the successor, so nothing replaces it.
    /// Returns the rest of the chain.
    pub(crate) fn discard<L: LiveEntry<S>>(
        mut self,
        live: &L,
        collector: &mut BlockCollector,
    ) -> Link<S> {
        if let Some(removed) = self.captured.take() {
            let survivors = self.later_states(live);
            S::collect_released(&removed, &survivors, collector);
        }
        tracing::debug!(removed = %self.snapshot, "discarded oldest diff");
        self.next.take()
    }
}

impl<S> Drop for DiffNode<S> {
    // Unlink iteratively so long chains do not recurse on drop.
    fn drop(&mut self) {
        let mut link = self.next.take();
        while let Some(mut node) = link {
            link = node.next.take();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FileAttributes;
    use crate::types::BlockId;

    fn attrs(permission: u16, blocks: &[u64]) -> FileAttributes {
        FileAttributes::new("hdfs", "supergroup", permission)
            .with_blocks(blocks.iter().map(|b| BlockId(*b)).collect())
    }

    fn link(
        mut first: DiffNode<FileAttributes>,
        second: DiffNode<FileAttributes>,
    ) -> DiffNode<FileAttributes> {
        first.next = Some(Box::new(second));
        first
    }

    #[test]
    fn test_try_new_without_snapshot() {
        let result = DiffNode::<FileAttributes>::try_new(None, None);
        assert!(matches!(result, Err(DiffError::MissingSnapshot)));

        let node = DiffNode::<FileAttributes>::try_new(Some(SnapshotId(1)), None).unwrap();
        assert_eq!(node.snapshot(), SnapshotId(1));
        assert!(!node.is_captured());
    }

    #[test]
    fn test_compare_to() {
        let node = DiffNode::<FileAttributes>::new(SnapshotId(5));
        assert_eq!(node.compare_to(SnapshotId(4)), Ordering::Greater);
        assert_eq!(node.compare_to(SnapshotId(5)), Ordering::Equal);
        assert_eq!(node.compare_to(SnapshotId(6)), Ordering::Less);
    }

    #[test]
    fn test_ensure_captured_is_write_once() {
        let live = attrs(0o600, &[]);
        let mut node = DiffNode::new(SnapshotId(1));

        assert!(node.ensure_captured(Some(attrs(0o644, &[])), &live));
        assert!(!node.ensure_captured(Some(attrs(0o755, &[])), &live));
        assert!(!node.ensure_captured(None, &live));

        assert_eq!(node.captured().unwrap().permission, 0o644);
    }

    #[test]
    fn test_ensure_captured_copies_live() {
        let mut live = attrs(0o644, &[1]);
        let mut node = DiffNode::<FileAttributes>::new(SnapshotId(1));
        node.ensure_captured(None, &live);

        live.permission = 0o600;
        live.blocks.push(BlockId(2));

        let captured = node.captured().unwrap();
        assert_eq!(captured.permission, 0o644);
        assert_eq!(captured.blocks, vec![BlockId(1)]);
    }

    #[test]
    fn test_resolve_falls_through() {
        let live = attrs(0o700, &[]);
        let chain = link(
            DiffNode::new(SnapshotId(1)),
            DiffNode::with_state(SnapshotId(2), attrs(0o644, &[])),
        );
        assert_eq!(chain.resolve_state(&live).permission, 0o644);

        let tail = DiffNode::<FileAttributes>::new(SnapshotId(3));
        assert_eq!(tail.resolve_state(&live).permission, 0o700);
    }

    #[test]
    fn test_merge_adopts_successor_state() {
        let live = attrs(0o700, &[1, 2, 3]);
        let earlier = DiffNode::new(SnapshotId(1));
        let successor = DiffNode::with_state(SnapshotId(2), attrs(0o644, &[1, 2]));

        let mut collector = BlockCollector::new();
        let merged = earlier
            .merge_with_successor(successor, &[], &live, &mut collector)
            .unwrap();

        assert_eq!(merged.snapshot(), SnapshotId(1));
        assert_eq!(merged.captured().unwrap().permission, 0o644);
        assert!(collector.is_empty());
    }

    #[test]
    fn test_merge_drops_successor_state_and_collects() {
        let live = attrs(0o700, &[1]);
        let earlier = DiffNode::with_state(SnapshotId(1), attrs(0o600, &[1]));
        let successor = DiffNode::with_state(SnapshotId(2), attrs(0o644, &[1, 2]));

        let mut collector = BlockCollector::new();
        let merged = earlier
            .merge_with_successor(successor, &[], &live, &mut collector)
            .unwrap();

        assert_eq!(merged.captured().unwrap().permission, 0o600);
        assert_eq!(collector.blocks(), &[BlockId(2)]);
    }

    #[test]
    fn test_merge_keeps_blocks_held_by_earlier_states() {
        let live = attrs(0o700, &[]);
        let older = attrs(0o600, &[9]);
        let earlier = DiffNode::with_state(SnapshotId(2), attrs(0o600, &[]));
        let successor = DiffNode::with_state(SnapshotId(3), attrs(0o644, &[9]));

        let mut collector = BlockCollector::new();
        earlier
            .merge_with_successor(successor, &[&older], &live, &mut collector)
            .unwrap();
        assert!(collector.is_empty());
    }

    #[test]
    fn test_merge_rejects_out_of_order() {
        let live = attrs(0o700, &[]);
        let earlier = DiffNode::<FileAttributes>::new(SnapshotId(3));
        let successor = DiffNode::new(SnapshotId(2));

        let mut collector = BlockCollector::new();
        let result = earlier.merge_with_successor(successor, &[], &live, &mut collector);
        assert!(matches!(
            result,
            Err(DiffError::NotAdjacent {
                earlier: SnapshotId(3),
                later: SnapshotId(2)
            })
        ));
    }

    #[test]
    fn test_merge_rejects_still_linked() {
        let live = attrs(0o700, &[]);
        let earlier = link(DiffNode::new(SnapshotId(1)), DiffNode::new(SnapshotId(2)));
        let other = DiffNode::new(SnapshotId(3));

        let mut collector = BlockCollector::new();
        let result = earlier.merge_with_successor(other, &[], &live, &mut collector);
        assert!(matches!(result, Err(DiffError::NotAdjacent { .. })));
    }

    #[test]
    fn test_discard_returns_rest() {
        let live = attrs(0o700, &[2]);
        let head = link(
            DiffNode::with_state(SnapshotId(1), attrs(0o600, &[1, 2])),
            DiffNode::new(SnapshotId(2)),
        );

        let mut collector = BlockCollector::new();
        let rest = head.discard(&live, &mut collector).unwrap();

        assert_eq!(rest.snapshot(), SnapshotId(2));
        assert_eq!(collector.blocks(), &[BlockId(1)]);
    }
}
