//! A file with its attribute history.

use crate::collector::BlockCollector;
use crate::diff::{ChainConfig, DiffChain};
use crate::error::Result;
use crate::state::FileAttributes;
use crate::types::{BlockId, InodeId, SnapshotId, Timestamp};

/// A file entry: live attributes plus the diffs needed to rebuild them as
/// of any retained snapshot.
///
/// Mutators take the latest snapshot visible to the file (if any). The
/// pre-mutation state is saved for it before anything changes.
#[derive(Debug)]
pub struct FileEntry {
    id: InodeId,
    attributes: FileAttributes,
    diffs: DiffChain<FileAttributes>,
}

impl FileEntry {
    pub fn new(id: InodeId, attributes: FileAttributes) -> Self {
        Self::with_config(id, attributes, ChainConfig::default())
    }

    pub fn with_config(id: InodeId, attributes: FileAttributes, config: ChainConfig) -> Self {
        Self {
            id,
            attributes,
            diffs: DiffChain::with_config(config),
        }
    }

    pub fn id(&self) -> InodeId {
        self.id
    }

    /// Live attributes.
    pub fn attributes(&self) -> &FileAttributes {
        &self.attributes
    }

    pub fn diffs(&self) -> &DiffChain<FileAttributes> {
        &self.diffs
    }

    /// Record that `snapshot` was taken while this file existed.
    pub fn take_snapshot(&mut self, snapshot: SnapshotId) -> Result<()> {
        self.diffs.check_and_add_latest(snapshot)?;
        Ok(())
    }

    /// Apply `change` to the live attributes, saving history first.
    pub fn modify<F>(&mut self, latest: Option<SnapshotId>, change: F) -> Result<()>
    where
        F: FnOnce(&mut FileAttributes),
    {
        if let Some(latest) = latest {
            self.diffs
                .save_before_mutation(latest, None, &self.attributes)?;
        }
        change(&mut self.attributes);
        Ok(())
    }

    pub fn add_block(&mut self, latest: Option<SnapshotId>, block: BlockId) -> Result<()> {
        self.modify(latest, |attrs| {
            attrs.blocks.push(block);
            attrs.modification_time = Timestamp::now();
        })
    }

    /// Keep only the first `keep` blocks.
    pub fn truncate_blocks(&mut self, latest: Option<SnapshotId>, keep: usize) -> Result<()> {
        self.modify(latest, |attrs| {
            attrs.blocks.truncate(keep);
            attrs.modification_time = Timestamp::now();
        })
    }

    pub fn set_permission(&mut self, latest: Option<SnapshotId>, permission: u16) -> Result<()> {
        self.modify(latest, |attrs| attrs.permission = permission)
    }

    /// Attributes as of `snapshot`.
    pub fn state_at(&self, snapshot: SnapshotId) -> &FileAttributes {
        self.diffs.state_at(snapshot, &self.attributes)
    }

    /// Forget `snapshot`, collecting blocks only it referenced.
    ///
    /// `prior` is the newest snapshot retained before it. Snapshots this file
    /// never recorded a diff for leave it untouched.
    pub fn delete_snapshot(
        &mut self,
        snapshot: SnapshotId,
        prior: Option<SnapshotId>,
        collector: &mut BlockCollector,
    ) -> Result<()> {
        if self.diffs.get(snapshot).is_none() {
            tracing::trace!(inode = ?self.id, %snapshot, "no diff for deleted snapshot");
            return Ok(());
        }
        self.diffs
            .delete_snapshot(snapshot, prior, &self.attributes, collector)
    }
}
