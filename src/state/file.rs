//! File attributes and block list.

use super::{LiveEntry, SnapshotState};
use crate::collector::BlockCollector;
use crate::types::{BlockId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default replication factor for new files.
const DEFAULT_REPLICATION: u16 = 3;

/// Default preferred block size (128 MiB).
const DEFAULT_BLOCK_SIZE: u64 = 128 * 1024 * 1024;

/// Attributes of a file, including its ordered block list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttributes {
    pub permission: u16,
    pub owner: String,
    pub group: String,
    pub modification_time: Timestamp,
    pub access_time: Timestamp,
    pub replication: u16,
    pub preferred_block_size: u64,
    pub blocks: Vec<BlockId>,

    /// Whether a writer currently holds the file open.
    pub under_construction: bool,
}

impl FileAttributes {
    /// Create attributes for an empty, closed file.
    pub fn new(owner: impl Into<String>, group: impl Into<String>, permission: u16) -> Self {
        let now = Timestamp::now();
        Self {
            permission,
            owner: owner.into(),
            group: group.into(),
            modification_time: now,
            access_time: now,
            replication: DEFAULT_REPLICATION,
            preferred_block_size: DEFAULT_BLOCK_SIZE,
            blocks: Vec::new(),
            under_construction: false,
        }
    }

    /// Replace the block list.
    pub fn with_blocks(mut self, blocks: Vec<BlockId>) -> Self {
        self.blocks = blocks;
        self
    }
}

impl SnapshotState for FileAttributes {
    fn referenced_blocks(&self) -> Vec<BlockId> {
        self.blocks.clone()
    }

    fn collect_released(removed: &Self, survivors: &[&Self], collector: &mut BlockCollector) {
        let kept: HashSet<BlockId> = survivors
            .iter()
            .flat_map(|s| s.blocks.iter().copied())
            .collect();

        for block in &removed.blocks {
            if !kept.contains(block) {
                collector.add_block(*block);
            }
        }
    }
}

impl LiveEntry<FileAttributes> for FileAttributes {
    fn current(&self) -> &FileAttributes {
        self
    }

    /// Snapshots never see an open writer.
    fn snapshot_copy(&self) -> FileAttributes {
        let mut copy = self.clone();
        copy.under_construction = false;
        copy
    }
}
