//! The chain of diffs attached to one entry.

use super::node::{DiffNode, Link};
use crate::collector::BlockCollector;
use crate::error::{DiffError, Result};
use crate::state::{LiveEntry, SnapshotState};
use crate::types::SnapshotId;
use std::cmp::Ordering;

/// Snapshots allowed per chain by default.
pub const DEFAULT_MAX_DIFFS: usize = 65_536;

/// Chain configuration.
#[derive(Clone, Debug)]
pub struct ChainConfig {
    /// Maximum number of diffs kept in one chain.
    pub max_len: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_DIFFS,
        }
    }
}

/// Counts describing a chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainStats {
    pub diffs: usize,
    pub captured: usize,
    pub uncaptured: usize,
}

/// Ordered, singly owned list of diffs for one kind of tracked state.
///
/// Nodes can only enter through [`DiffChain::append`], which requires each
/// snapshot to be later than the current tail. Together with single
/// ownership of every link that keeps the chain sorted and acyclic.
#[derive(Debug)]
pub struct DiffChain<S> {
    head: Link<S>,
    len: usize,
    config: ChainConfig,
}

impl<S: SnapshotState> Default for DiffChain<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SnapshotState> DiffChain<S> {
    /// Create an empty chain with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ChainConfig::default())
    }

    pub fn with_config(config: ChainConfig) -> Self {
        Self {
            head: None,
            len: 0,
            config,
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> Iter<'_, S> {
        Iter {
            next: self.head.as_deref(),
        }
    }

    /// The oldest diff.
    pub fn head(&self) -> Option<&DiffNode<S>> {
        self.head.as_deref()
    }

    /// The most recent diff.
    pub fn last(&self) -> Option<&DiffNode<S>> {
        self.iter().last()
    }

    pub fn last_snapshot(&self) -> Option<SnapshotId> {
        self.last().map(DiffNode::snapshot)
    }

    pub fn snapshots(&self) -> Vec<SnapshotId> {
        self.iter().map(DiffNode::snapshot).collect()
    }

    fn tail_mut(&mut self) -> Option<&mut DiffNode<S>> {
        let mut node = self.head.as_deref_mut()?;
        while node.next().is_some() {
            node = node.next_link_mut().as_deref_mut()?;
        }
        Some(node)
    }

    /// The empty link after the tail.
    fn end_link(&mut self) -> &mut Link<S> {
        let mut link = &mut self.head;
        while let Some(node) = link {
            link = node.next_link_mut();
        }
        link
    }

    /// The link holding the node at `index`.
    fn link_at(&mut self, index: usize) -> Option<&mut Link<S>> {
        let mut link = &mut self.head;
        for _ in 0..index {
            link = link.as_mut()?.next_link_mut();
        }
        Some(link)
    }

    /// Add a new uncaptured diff for `snapshot` at the tail.
    pub fn append(&mut self, snapshot: SnapshotId) -> Result<&mut DiffNode<S>> {
        self.push(DiffNode::new(snapshot))
    }

    /// Add a detached node at the tail, enforcing order and capacity.
    pub(crate) fn push(&mut self, node: DiffNode<S>) -> Result<&mut DiffNode<S>> {
        if let Some(tail) = self.last_snapshot() {
            if node.snapshot() <= tail {
                return Err(DiffError::OutOfOrder {
                    tail,
                    got: node.snapshot(),
                });
            }
        }
        if self.len >= self.config.max_len {
            return Err(DiffError::ChainFull(self.config.max_len));
        }

        self.len += 1;
        let link = self.end_link();
        Ok(&mut **link.insert(Box::new(node)))
    }

    /// The diff for `latest`, appending one if the tail belongs to an older
    /// snapshot.
    pub fn check_and_add_latest(&mut self, latest: SnapshotId) -> Result<&mut DiffNode<S>> {
        if self.last_snapshot() != Some(latest) {
            self.append(latest)?;
        }
        self.tail_mut().ok_or(DiffError::SnapshotNotFound(latest))
    }

    /// Preserve the pre-mutation state for `latest`.
    ///
    /// Call before every mutation of the live entry made while `latest` is
    /// the newest snapshot; only the first call per snapshot captures.
    pub fn save_before_mutation<L: LiveEntry<S>>(
        &mut self,
        latest: SnapshotId,
        fallback: Option<S>,
        live: &L,
    ) -> Result<bool> {
        let node = self.check_and_add_latest(latest)?;
        Ok(node.ensure_captured(fallback, live))
    }

    /// The diff with exactly this snapshot.
    pub fn get(&self, snapshot: SnapshotId) -> Option<&DiffNode<S>> {
        self.iter()
            .find(|node| node.compare_to(snapshot) == Ordering::Equal)
    }

    /// The first diff at or after `snapshot`.
    pub fn find(&self, snapshot: SnapshotId) -> Option<&DiffNode<S>> {
        self.iter()
            .find(|node| node.compare_to(snapshot) != Ordering::Less)
    }

    /// State of the entry as of `snapshot`.
    ///
    /// Snapshots newer than the tail see the live state.
    pub fn state_at<'a, L: LiveEntry<S>>(&'a self, snapshot: SnapshotId, live: &'a L) -> &'a S {
        match self.find(snapshot) {
            Some(node) => node.resolve_state(live),
            None => live.current(),
        }
    }

    /// Remove the diff for a deleted snapshot.
    ///
    /// `prior` is the newest snapshot still retained before `snapshot`. A
    /// retained snapshot can lack a diff of its own, in which case its state
    /// is the one stored by the diff being deleted. When the diff before
    /// this one does not belong to `prior`, the diff is therefore handed
    /// over to `prior` instead of being removed. Otherwise the oldest diff is
    /// discarded outright and any other is merged into the diff before it.
    /// Released blocks go to `collector`.
    pub fn delete_snapshot<L: LiveEntry<S>>(
        &mut self,
        snapshot: SnapshotId,
        prior: Option<SnapshotId>,
        live: &L,
        collector: &mut BlockCollector,
    ) -> Result<()> {
        let index = self
            .iter()
            .position(|node| node.snapshot() == snapshot)
            .ok_or(DiffError::SnapshotNotFound(snapshot))?;
        let previous = match index {
            0 => None,
            _ => self.iter().nth(index - 1).map(DiffNode::snapshot),
        };

        match (prior, previous) {
            (Some(prior), _) if prior >= snapshot => {
                return Err(DiffError::PriorNotEarlier { snapshot, prior });
            }
            (prior, Some(previous)) if prior.map_or(true, |p| p < previous) => {
                return Err(DiffError::PriorSkipsDiff { snapshot, previous });
            }
            (Some(prior), previous) if previous != Some(prior) => {
                let node = self
                    .link_at(index)
                    .and_then(|link| link.as_deref_mut())
                    .ok_or(DiffError::SnapshotNotFound(snapshot))?;
                node.rekey(prior);
                return Ok(());
            }
            _ => {}
        }

        if index == 0 {
            let head = self
                .head
                .take()
                .ok_or(DiffError::SnapshotNotFound(snapshot))?;
            self.head = (*head).discard(live, collector);
            self.len -= 1;
            return Ok(());
        }

        // Validated above; every path below relinks `before`.
        let mut before = self
            .link_at(index - 1)
            .and_then(Option::take)
            .ok_or(DiffError::SnapshotNotFound(snapshot))?;
        let removed = match before.next_link_mut().take() {
            Some(removed) => removed,
            None => {
                *self.end_link() = Some(before);
                return Err(DiffError::SnapshotNotFound(snapshot));
            }
        };

        // Everything still linked from `head` is older than the pair.
        {
            let earlier: Vec<&S> = self.iter().filter_map(DiffNode::captured).collect();
            before.absorb(*removed, &earlier, live, collector);
        }

        *self.end_link() = Some(before);
        self.len -= 1;
        Ok(())
    }

    pub fn stats(&self) -> ChainStats {
        let mut stats = ChainStats::default();
        for node in self.iter() {
            stats.diffs += 1;
            if node.is_captured() {
                stats.captured += 1;
            } else {
                stats.uncaptured += 1;
            }
        }
        stats
    }
}

/// Iterator over a chain, oldest first.
pub struct Iter<'a, S> {
    next: Option<&'a DiffNode<S>>,
}

impl<'a, S: SnapshotState> Iterator for Iter<'a, S> {
    type Item = &'a DiffNode<S>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.next();
        Some(node)
    }
}

impl<'a, S: SnapshotState> IntoIterator for &'a DiffChain<S> {
    type Item = &'a DiffNode<S>;
    type IntoIter = Iter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
