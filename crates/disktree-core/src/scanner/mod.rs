/// Scanner module — orchestrates the filesystem traversal.
///
/// One scan runs on one dedicated worker thread. The worker writes into a
/// **shared `LiveTree`** (`Arc<RwLock<EntryTree>>`) so the caller can render
/// a real-time, incrementally-growing tree view while the scan is running,
/// and polls an atomic flag so the caller can cancel mid-flight.
pub mod progress;
pub mod walk;

use crate::model::EntryTree;
use progress::ScanProgress;

use crossbeam_channel::Receiver;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::info;

/// A shared, concurrently-readable entry tree.
///
/// The scanner holds a write lock briefly when inserting a folder's
/// children. The caller holds a read lock each refresh to render the live
/// tree; between refreshes its view is at worst stale, never torn.
pub type LiveTree = Arc<RwLock<EntryTree>>;

/// Which traversal strategy the worker uses. Both produce identical sizes
/// and membership on completion; only the order of intermediate states a
/// concurrent reader can observe differs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Traversal {
    /// Queue-based, roughly breadth-first. The default.
    #[default]
    BreadthFirst,
    /// Recursive, depth-first — each subtree finishes before its siblings.
    DepthFirst,
}

/// Handle to a running or completed scan. Allows cancellation and
/// receiving progress updates.
pub struct ScanHandle {
    /// Receiver for progress updates from the scan thread.
    pub progress_rx: Receiver<ScanProgress>,
    /// Shared tree that is populated incrementally during scanning.
    pub live_tree: LiveTree,
    /// Flag to request cancellation.
    cancel_flag: Arc<AtomicBool>,
    /// Join handle for the scan thread.
    _thread: Option<thread::JoinHandle<()>>,
}

impl ScanHandle {
    /// Request the scan to stop at its next per-folder checkpoint.
    ///
    /// Cooperative: the listing currently in flight completes normally and
    /// nothing already aggregated is rolled back. Calling this repeatedly,
    /// or after the scan finished, is a no-op.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }
}

/// Maximum number of progress messages that may queue up in the channel.
///
/// The caller drains this channel on its own cadence. A burst of 4 096
/// messages gives the scanner plenty of headroom; if the caller falls far
/// behind, the scanner stalls briefly on `send` rather than consuming
/// unbounded heap.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Start a new scan of `root_path` on a background thread.
///
/// The root entry is prepared synchronously (pure constructor, no I/O), so
/// the returned handle's `live_tree` is immediately renderable as an empty,
/// `Unprocessed` root. An unlistable root path is not an error here — the
/// first listing step records it on the root entry like any other folder's
/// failure.
pub fn start_scan(root_path: PathBuf, traversal: Traversal) -> ScanHandle {
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<ScanProgress>(PROGRESS_CHANNEL_CAPACITY);
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let cancel_clone = cancel_flag.clone();

    let live_tree: LiveTree = Arc::new(RwLock::new(EntryTree::prepare(root_path.clone())));
    let tree_clone = live_tree.clone();

    let thread = thread::Builder::new()
        .name("disktree-scanner".into())
        .spawn(move || {
            info!("starting {traversal:?} scan of {}", root_path.display());
            match traversal {
                Traversal::BreadthFirst => {
                    walk::build_breadth_first(&tree_clone, &progress_tx, &cancel_clone)
                }
                Traversal::DepthFirst => {
                    walk::build_depth_first(&tree_clone, &progress_tx, &cancel_clone)
                }
            }
        })
        .expect("failed to spawn scanner thread");

    ScanHandle {
        progress_rx,
        live_tree,
        cancel_flag,
        _thread: Some(thread),
    }
}
