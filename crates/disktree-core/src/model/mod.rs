/// Data model for the disktree entry tree.
///
/// Re-exports the arena-allocated tree structure and supporting types.
pub mod entry;
pub mod size;
pub mod sort;
pub mod tree;

pub use entry::{Entry, EntryId, EntryState, ListError};
pub use sort::{sort_entries, SortBy};
pub use tree::EntryTree;
