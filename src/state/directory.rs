//! Directory attributes and child list.

use super::{LiveEntry, SnapshotState};
use crate::collector::BlockCollector;
use crate::types::{BlockId, InodeId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A child as recorded in a directory's child list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildEntry {
    pub inode: InodeId,

    /// Blocks owned by the child. Empty for subdirectories.
    pub blocks: Vec<BlockId>,
}

impl ChildEntry {
    pub fn file(inode: InodeId, blocks: Vec<BlockId>) -> Self {
        Self { inode, blocks }
    }

    pub fn directory(inode: InodeId) -> Self {
        Self {
            inode,
            blocks: Vec::new(),
        }
    }
}

/// Attributes of a directory together with its children, keyed by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryState {
    pub permission: u16,
    pub owner: String,
    pub group: String,
    pub modification_time: Timestamp,
    pub children: BTreeMap<String, ChildEntry>,
}

impl DirectoryState {
    /// Create an empty directory.
    pub fn new(owner: impl Into<String>, group: impl Into<String>, permission: u16) -> Self {
        Self {
            permission,
            owner: owner.into(),
            group: group.into(),
            modification_time: Timestamp::now(),
            children: BTreeMap::new(),
        }
    }

    pub fn with_child(mut self, name: impl Into<String>, child: ChildEntry) -> Self {
        self.children.insert(name.into(), child);
        self
    }

    pub fn child(&self, name: &str) -> Option<&ChildEntry> {
        self.children.get(name)
    }

    /// Child names in lexicographic order.
    pub fn names(&self) -> Vec<&str> {
        self.children.keys().map(String::as_str).collect()
    }
}

impl SnapshotState for DirectoryState {
    fn referenced_blocks(&self) -> Vec<BlockId> {
        self.children
            .values()
            .flat_map(|c| c.blocks.iter().copied())
            .collect()
    }

    /// A child that no surviving list mentions is destroyed, which releases
    /// its inode and whichever of its blocks nobody else holds. Children
    /// still listed somewhere keep everything.
    fn collect_released(removed: &Self, survivors: &[&Self], collector: &mut BlockCollector) {
        let mut kept_inodes = HashSet::new();
        let mut kept_blocks = HashSet::new();
        for state in survivors {
            for child in state.children.values() {
                kept_inodes.insert(child.inode);
                kept_blocks.extend(child.blocks.iter().copied());
            }
        }

        for child in removed.children.values() {
            if kept_inodes.contains(&child.inode) {
                continue;
            }
            collector.add_inode(child.inode);
            for block in &child.blocks {
                if !kept_blocks.contains(block) {
                    collector.add_block(*block);
                }
            }
        }
    }
}

impl LiveEntry<DirectoryState> for DirectoryState {
    fn current(&self) -> &DirectoryState {
        self
    }

    fn snapshot_copy(&self) -> DirectoryState {
        self.clone()
    }
}
