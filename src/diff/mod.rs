//! Reverse-delta diff chains.
//!
//! Each entry keeps one chain per kind of tracked state. The live state is
//! the newest version; every diff records what the state looked like as of
//! its snapshot, and only when the state actually changed afterwards:
//!
//! ```text
//!   s_n = current - d_n
//!   s_k = current - d_n - d_{n-1} - ... - d_k
//! ```
//!
//! Reads walk forward from the requested snapshot to the first recorded
//! state. Deleting a snapshot folds its diff into the one before it and
//! reports storage blocks that nothing retained still references.

mod chain;
mod node;

pub use chain::{ChainConfig, ChainStats, DiffChain, Iter, DEFAULT_MAX_DIFFS};
pub use node::DiffNode;
