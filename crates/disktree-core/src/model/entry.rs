/// A single node in the arena-allocated entry tree.
///
/// Entries are stored in a flat `Vec<Entry>` for cache-friendly traversal.
/// Parent-child relationships use indices rather than pointers, so the
/// child -> parent back-reference never forms an ownership cycle.
use compact_str::CompactString;
use std::path::PathBuf;
use thiserror::Error;

/// Lightweight index into the arena `Vec<Entry>`.
///
/// Uses `u32` to keep entries small — supports up to ~4 billion nodes,
/// which is more than enough for any real filesystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u32);

impl EntryId {
    /// Create a new `EntryId` from a `usize`, panicking if it exceeds `u32::MAX`.
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "EntryId overflow");
        Self(index as u32)
    }

    /// Return the index as a `usize` for Vec indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Lifecycle stage of an entry's own listing step.
///
/// Transitions are monotonic within a single scan run:
/// `Unprocessed -> Processing -> {Processed, Error}`. Files skip straight
/// to `Processed` at creation; folders walk the full machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryState {
    /// Discovered but not yet listed.
    Unprocessed,
    /// The folder's own listing is underway, or descendants are still pending.
    Processing,
    /// Terminal: the entire subtree has been listed; `size` is final.
    Processed,
    /// Terminal: the directory listing itself failed. `size` keeps whatever
    /// was collected before the failure.
    Error,
}

/// Error recorded on a folder whose directory listing failed.
///
/// Cloneable so the tree stays `Clone`; the underlying `std::io::Error`
/// is reduced to its kind plus a display message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ListError {
    /// The I/O error kind (e.g. `PermissionDenied`, `NotFound`).
    pub kind: std::io::ErrorKind,
    /// Human-readable message from the original error.
    pub message: String,
}

impl From<std::io::Error> for ListError {
    fn from(err: std::io::Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// A single file or folder in the tree.
///
/// Stored in a flat arena (`Vec<Entry>`). Child collections are append-only
/// during a scan, so a concurrent reader iterating a snapshot of
/// `folders`/`files` only ever sees entries that exist.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Full filesystem path of this entry. Unique per node.
    pub path: PathBuf,

    /// Final path segment. The root entry uses its full path string as its
    /// name; every other entry uses the base name.
    pub name: CompactString,

    /// `true` if this entry represents a folder. Fixed at creation.
    pub is_folder: bool,

    /// Cumulative byte count. For a file, its own length. For a folder, the
    /// running total of all descendant files seen so far; final once
    /// `state == Processed`.
    pub size: u64,

    /// Own lifecycle state, monotonic within one scan run.
    pub state: EntryState,

    /// Last error encountered listing this folder. Set only when
    /// `state == Error`.
    pub error: Option<ListError>,

    /// Direct child folders, in discovery order.
    pub folders: Vec<EntryId>,

    /// Direct child files, in discovery order.
    pub files: Vec<EntryId>,

    /// Non-owning back-reference used for upward size propagation and
    /// state bubbling. `None` for the root.
    pub parent: Option<EntryId>,

    /// Count of listings currently active on this entry or any descendant.
    /// Maintained by the tree's bubbling loops; mirrors entry into and exit
    /// from `Processing`, it is never an independent status.
    pub(crate) active_listings: u32,

    /// Direct child folders that have not yet reached a terminal state.
    /// When this hits zero after the own listing finished, the folder
    /// completes and the completion cascades to the parent.
    pub(crate) pending_folders: u32,

    /// `true` once this folder's own listing finished (successfully or not).
    pub(crate) listed: bool,
}

impl Entry {
    /// Create a new file entry. Files are terminal immediately — their size
    /// is known at discovery.
    pub fn new_file(path: PathBuf, name: CompactString, size: u64, parent: EntryId) -> Self {
        Self {
            path,
            name,
            is_folder: false,
            size,
            state: EntryState::Processed,
            error: None,
            folders: Vec::new(),
            files: Vec::new(),
            parent: Some(parent),
            active_listings: 0,
            pending_folders: 0,
            listed: false,
        }
    }

    /// Create a new folder entry, not yet listed.
    pub fn new_folder(path: PathBuf, name: CompactString, parent: Option<EntryId>) -> Self {
        Self {
            path,
            name,
            is_folder: true,
            size: 0,
            state: EntryState::Unprocessed,
            error: None,
            folders: Vec::new(),
            files: Vec::new(),
            parent,
            active_listings: 0,
            pending_folders: 0,
            listed: false,
        }
    }

    /// `true` while this entry, or any descendant, is actively mid-listing.
    ///
    /// This is the "activity" indication a frontend renders on every
    /// ancestor of the folder currently being read; it reverts as soon as
    /// that listing finishes.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.active_listings > 0
    }

    /// State for presentation: `Processing` while any listing is active in
    /// this subtree, the entry's own resting state otherwise.
    pub fn display_state(&self) -> EntryState {
        if self.active_listings > 0 {
            EntryState::Processing
        } else {
            self.state
        }
    }
}
