//! # Snapshot Diffs
//!
//! Reverse-delta version chains that let a filesystem metadata service
//! answer "what did this entry look like as of snapshot S" without keeping
//! a full copy of the entry per snapshot.
//!
//! ## Core Concepts
//!
//! - **Diffs**: One node per snapshot, holding a frozen copy of the entry's
//!   state only if the entry changed after that snapshot
//! - **Chains**: Diffs ordered oldest to newest; the live entry follows the tail
//! - **Lazy capture**: State is copied right before the first mutation
//! - **Deletion**: Removing a snapshot merges its diff away and reports
//!   blocks no retained snapshot still needs
//!
//! ## Example
//!
//! ```ignore
//! use snapdiff::{BlockCollector, BlockId, FileAttributes, FileEntry, InodeId, SnapshotId};
//!
//! let mut file = FileEntry::new(InodeId(1), FileAttributes::new("hdfs", "supergroup", 0o644));
//! file.add_block(None, BlockId(1))?;
//!
//! file.take_snapshot(SnapshotId(1))?;
//! file.truncate_blocks(Some(SnapshotId(1)), 0)?;
//! assert_eq!(file.state_at(SnapshotId(1)).blocks, vec![BlockId(1)]);
//!
//! let mut collector = BlockCollector::new();
//! file.delete_snapshot(SnapshotId(1), None, &mut collector)?;
//! assert_eq!(collector.blocks(), &[BlockId(1)]);
//! ```

pub mod collector;
pub mod diff;
pub mod entry;
pub mod error;
pub mod image;
pub mod state;
pub mod types;

// Re-exports
pub use collector::BlockCollector;
pub use diff::{ChainConfig, ChainStats, DiffChain, DiffNode, DEFAULT_MAX_DIFFS};
pub use entry::{DirectoryEntry, EntryHandle, FileEntry};
pub use error::{DiffError, Result};
pub use state::{ChildEntry, DirectoryState, FileAttributes, LiveEntry, SnapshotState};
pub use types::*;
