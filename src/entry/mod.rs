//! Filesystem entries that own diff chains.

mod directory;
mod file;
mod handle;

pub use directory::DirectoryEntry;
pub use file::FileEntry;
pub use handle::EntryHandle;
