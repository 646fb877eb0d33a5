//! Error types for diff chains.

use crate::types::SnapshotId;
use thiserror::Error;

/// Main error type for chain operations.
///
/// Every variant except the image ones is a caller contract violation:
/// nothing here is transient and nothing is worth retrying.
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("Diff node constructed without a snapshot")]
    MissingSnapshot,

    #[error("Snapshot {got} is not after the chain tail {tail}")]
    OutOfOrder { tail: SnapshotId, got: SnapshotId },

    #[error("Diffs are not adjacent: {earlier} cannot merge with {later}")]
    NotAdjacent {
        earlier: SnapshotId,
        later: SnapshotId,
    },

    #[error("Prior snapshot {prior} is not before {snapshot}")]
    PriorNotEarlier {
        snapshot: SnapshotId,
        prior: SnapshotId,
    },

    #[error("Snapshot {previous} has a diff between {snapshot} and its prior")]
    PriorSkipsDiff {
        snapshot: SnapshotId,
        previous: SnapshotId,
    },

    #[error("Snapshot not found in chain: {0}")]
    SnapshotNotFound(SnapshotId),

    #[error("Chain is full ({0} diffs)")]
    ChainFull(usize),

    #[error("Invalid image format: {0}")]
    InvalidFormat(String),

    #[error("Checksum mismatch: expected {expected}, got {got}")]
    ChecksumMismatch { expected: u32, got: u32 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl From<rmp_serde::encode::Error> for DiffError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        DiffError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for DiffError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        DiffError::Deserialization(e.to_string())
    }
}

/// Result type for chain operations.
pub type Result<T> = std::result::Result<T, DiffError>;
