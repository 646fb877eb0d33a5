//! Sink for blocks and entries released by snapshot deletion.

use crate::types::{BlockId, InodeId};
use std::collections::HashSet;

/// Append-only collection of released blocks and removed entries.
///
/// Chain operations only ever append. Releasing the blocks is up to the
/// owner, after the deletion that filled the collector has finished.
#[derive(Debug, Default)]
pub struct BlockCollector {
    blocks: Vec<BlockId>,
    inodes: Vec<InodeId>,
    seen_blocks: HashSet<BlockId>,
    seen_inodes: HashSet<InodeId>,
}

impl BlockCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a block for release. Repeats are ignored.
    pub fn add_block(&mut self, block: BlockId) {
        if self.seen_blocks.insert(block) {
            tracing::trace!(%block, "block collected");
            self.blocks.push(block);
        }
    }

    /// Report an entry that no snapshot or live state references any more.
    pub fn add_inode(&mut self, inode: InodeId) {
        if self.seen_inodes.insert(inode) {
            tracing::trace!(%inode, "inode collected");
            self.inodes.push(inode);
        }
    }

    /// Released blocks, in the order they were reported.
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Removed entries, in the order they were reported.
    pub fn inodes(&self) -> &[InodeId] {
        &self.inodes
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.inodes.is_empty()
    }

    /// Hand the collected ids to the owner.
    pub fn into_parts(self) -> (Vec<BlockId>, Vec<InodeId>) {
        (self.blocks, self.inodes)
    }
}
