//! Tracked sub-states of a filesystem entry.
//!
//! Each kind of state an entry versions (a file's attributes and block list,
//! a directory's child list) implements [`SnapshotState`]. The generic chain
//! logic lives in [`crate::diff`]; only the rule for what a deleted snapshot
//! releases differs per kind.

mod directory;
mod file;

pub use directory::{ChildEntry, DirectoryState};
pub use file::FileAttributes;

use crate::collector::BlockCollector;
use crate::types::BlockId;
use std::fmt;

/// State that can be frozen into a diff node.
pub trait SnapshotState: Clone + fmt::Debug {
    /// Every block this state references.
    fn referenced_blocks(&self) -> Vec<BlockId>;

    /// Report what dropping `removed` releases.
    ///
    /// `survivors` holds every state that is still reachable after the drop:
    /// captured states of retained diffs and the live state. Nothing they
    /// reference may be reported.
    fn collect_released(removed: &Self, survivors: &[&Self], collector: &mut BlockCollector);
}

/// The live (current) side of an entry, as seen by its chain.
pub trait LiveEntry<S> {
    /// Current state of the entry.
    fn current(&self) -> &S;

    /// A fresh, independently owned copy suitable for storing in a diff.
    fn snapshot_copy(&self) -> S;
}
