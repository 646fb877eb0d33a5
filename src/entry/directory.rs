//! A directory with its child-list history.

use crate::collector::BlockCollector;
use crate::diff::{ChainConfig, DiffChain};
use crate::error::Result;
use crate::state::{ChildEntry, DirectoryState};
use crate::types::{InodeId, SnapshotId, Timestamp};

/// A directory entry: live child list plus its diffs.
#[derive(Debug)]
pub struct DirectoryEntry {
    id: InodeId,
    state: DirectoryState,
    diffs: DiffChain<DirectoryState>,
}

impl DirectoryEntry {
    pub fn new(id: InodeId, state: DirectoryState) -> Self {
        Self::with_config(id, state, ChainConfig::default())
    }

    pub fn with_config(id: InodeId, state: DirectoryState, config: ChainConfig) -> Self {
        Self {
            id,
            state,
            diffs: DiffChain::with_config(config),
        }
    }

    pub fn id(&self) -> InodeId {
        self.id
    }

    /// Live attributes and children.
    pub fn state(&self) -> &DirectoryState {
        &self.state
    }

    pub fn diffs(&self) -> &DiffChain<DirectoryState> {
        &self.diffs
    }

    pub fn take_snapshot(&mut self, snapshot: SnapshotId) -> Result<()> {
        self.diffs.check_and_add_latest(snapshot)?;
        Ok(())
    }

    pub fn modify<F>(&mut self, latest: Option<SnapshotId>, change: F) -> Result<()>
    where
        F: FnOnce(&mut DirectoryState),
    {
        if let Some(latest) = latest {
            self.diffs.save_before_mutation(latest, None, &self.state)?;
        }
        change(&mut self.state);
        Ok(())
    }

    /// Insert or replace a child, returning the one it replaced.
    pub fn add_child(
        &mut self,
        latest: Option<SnapshotId>,
        name: impl Into<String>,
        child: ChildEntry,
    ) -> Result<Option<ChildEntry>> {
        let mut replaced = None;
        self.modify(latest, |state| {
            replaced = state.children.insert(name.into(), child);
            state.modification_time = Timestamp::now();
        })?;
        Ok(replaced)
    }

    pub fn remove_child(
        &mut self,
        latest: Option<SnapshotId>,
        name: &str,
    ) -> Result<Option<ChildEntry>> {
        if !self.state.children.contains_key(name) {
            return Ok(None);
        }

        let mut removed = None;
        self.modify(latest, |state| {
            removed = state.children.remove(name);
            state.modification_time = Timestamp::now();
        })?;
        Ok(removed)
    }

    pub fn set_permission(&mut self, latest: Option<SnapshotId>, permission: u16) -> Result<()> {
        self.modify(latest, |state| state.permission = permission)
    }

    pub fn state_at(&self, snapshot: SnapshotId) -> &DirectoryState {
        self.diffs.state_at(snapshot, &self.state)
    }

    /// Forget `snapshot`, collecting children that only it still listed.
    ///
    /// Same contract as [`FileEntry::delete_snapshot`](crate::FileEntry::delete_snapshot).
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
            .delete_snapshot(snapshot, prior, &self.state, collector)
    }
}
