/// Single-threaded tree builders — one worker walks the filesystem and
/// writes entries into a shared `LiveTree` so the caller can render the
/// tree in real time.
///
/// Two interchangeable strategies are provided. Both drive the same
/// per-folder step ([`process_folder`]) and produce identical sizes and
/// membership when run to completion; they differ only in the order folders
/// are visited, i.e. in the intermediate states a concurrent reader can
/// observe.
///
/// # Lock discipline
///
/// The write lock on the shared tree is held only for in-memory mutation:
/// once briefly to mark a folder as actively listing, and once to insert
/// the folder's children and record the listing outcome. The blocking
/// `read_dir` call and all per-child stat calls happen between the two,
/// with no lock held, so a rendering reader is never stalled behind I/O.
use crate::model::{EntryId, ListError};
use crate::scanner::progress::ScanProgress;
use crate::scanner::LiveTree;
use compact_str::CompactString;
use crossbeam_channel::Sender;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, warn};

/// Send a progress `Update` roughly every this many folder listings.
///
/// Folders are the natural cadence unit here: the worker already pauses
/// between them for the cancellation check, and per-folder counters are
/// cheap compared to the listing syscalls.
const UPDATE_EVERY_FOLDERS: u64 = 25;

/// Running counters for one walk, reported through `ScanProgress::Update`.
#[derive(Default)]
struct WalkStats {
    files_found: u64,
    dirs_found: u64,
    total_size: u64,
    error_count: u64,
}

/// One child collected from a directory listing, stat'ed outside the lock.
enum ListedChild {
    File {
        path: PathBuf,
        name: CompactString,
        len: u64,
    },
    Folder {
        path: PathBuf,
        name: CompactString,
    },
}

/// Iterative, queue-based builder — processes folders roughly breadth-first.
///
/// This is the default strategy: the cancellation checkpoint falls out of
/// the loop structure and arbitrarily deep trees cannot exhaust the stack.
pub fn build_breadth_first(
    live_tree: &LiveTree,
    progress_tx: &Sender<ScanProgress>,
    cancel_flag: &AtomicBool,
) {
    let start = Instant::now();
    let mut stats = WalkStats::default();
    let mut queue = VecDeque::new();
    queue.push_back(live_tree.read().root());

    while let Some(id) = queue.pop_front() {
        // One directory listing is an atomic unit of work; cancellation is
        // observed only between folders. Folders not yet scheduled stay
        // Unprocessed and nothing already aggregated is rolled back.
        if cancel_flag.load(Ordering::Relaxed) {
            let _ = progress_tx.send(ScanProgress::Cancelled);
            return;
        }
        let discovered = process_folder(live_tree, id, progress_tx, &mut stats);
        queue.extend(discovered);
        maybe_send_update(live_tree, id, progress_tx, &stats);
    }

    send_complete(start, &stats, progress_tx);
}

/// Recursive builder — processes each folder's entire subtree before
/// moving to the next sibling (depth-first).
///
/// Size-equivalent to [`build_breadth_first`] at completion; folder sizes
/// simply finalize in post-order rather than when the last pending branch
/// drains.
pub fn build_depth_first(
    live_tree: &LiveTree,
    progress_tx: &Sender<ScanProgress>,
    cancel_flag: &AtomicBool,
) {
    let start = Instant::now();
    let mut stats = WalkStats::default();
    let root = live_tree.read().root();

    if !visit(live_tree, root, progress_tx, cancel_flag, &mut stats) {
        let _ = progress_tx.send(ScanProgress::Cancelled);
        return;
    }

    send_complete(start, &stats, progress_tx);
}

/// Depth-first descent. Returns `false` once cancellation is observed so
/// the unwinding callers stop scheduling siblings.
fn visit(
    live_tree: &LiveTree,
    id: EntryId,
    progress_tx: &Sender<ScanProgress>,
    cancel_flag: &AtomicBool,
    stats: &mut WalkStats,
) -> bool {
    if cancel_flag.load(Ordering::Relaxed) {
        return false;
    }
    let discovered = process_folder(live_tree, id, progress_tx, stats);
    maybe_send_update(live_tree, id, progress_tx, stats);
    for child in discovered {
        if !visit(live_tree, child, progress_tx, cancel_flag, stats) {
            return false;
        }
    }
    true
}

/// One folder's processing step: mark it active, list it, record its
/// children, finish with the outcome. Returns the discovered subfolders for
/// the caller to schedule.
fn process_folder(
    live_tree: &LiveTree,
    id: EntryId,
    progress_tx: &Sender<ScanProgress>,
    stats: &mut WalkStats,
) -> Vec<EntryId> {
    // Mark the folder active before the blocking listing call so readers
    // see the activity bubble on all ancestors while the OS call runs.
    let path = {
        let mut tree = live_tree.write();
        tree.begin_listing(id);
        tree.entry(id).path.clone()
    };
    stats.dirs_found += 1;

    let listing = match fs::read_dir(&path) {
        Ok(iter) => iter,
        Err(err) => {
            // A single unreadable folder never aborts the scan; the error
            // lands on the node and the walk continues with other folders.
            warn!("cannot list {}: {err}", path.display());
            stats.error_count += 1;
            let _ = progress_tx.send(ScanProgress::Error {
                path: path.to_string_lossy().into_owned(),
                message: err.to_string(),
            });
            live_tree
                .write()
                .finish_listing(id, Err(ListError::from(err)));
            return Vec::new();
        }
    };

    // Fully consume the listing and stat every child before taking the
    // write lock; the listing handle is released here, within this step.
    let mut children: Vec<ListedChild> = Vec::new();
    for dent in listing {
        let dent = match dent {
            Ok(d) => d,
            Err(err) => {
                record_child_error(&path, &err, progress_tx, stats);
                continue;
            }
        };
        let name = CompactString::new(dent.file_name().to_string_lossy());
        let child_path = dent.path();
        let file_type = match dent.file_type() {
            Ok(t) => t,
            Err(err) => {
                record_child_error(&child_path, &err, progress_tx, stats);
                continue;
            }
        };
        if file_type.is_dir() {
            children.push(ListedChild::Folder {
                path: child_path,
                name,
            });
        } else {
            // Symlinks are not followed: `DirEntry::metadata` does not
            // traverse links, so a link counts as a file of its own length.
            let len = match dent.metadata() {
                Ok(meta) => meta.len(),
                Err(err) => {
                    record_child_error(&child_path, &err, progress_tx, stats);
                    continue;
                }
            };
            children.push(ListedChild::File {
                path: child_path,
                name,
                len,
            });
        }
    }

    let mut discovered = Vec::with_capacity(8);
    {
        let mut tree = live_tree.write();
        for child in children {
            match child {
                ListedChild::File { path, name, len } => {
                    tree.add_file(id, path, name, len);
                    stats.files_found += 1;
                    stats.total_size += len;
                }
                ListedChild::Folder { path, name } => {
                    discovered.push(tree.add_folder(id, path, name));
                }
            }
        }
        tree.finish_listing(id, Ok(()));
    }
    debug!(
        "listed {}: {} subfolders, {} files so far",
        path.display(),
        discovered.len(),
        stats.files_found
    );
    discovered
}

/// A failure on one child's metadata skips that child only; it is logged
/// and reported but never becomes the parent folder's error.
fn record_child_error(
    path: &std::path::Path,
    err: &std::io::Error,
    progress_tx: &Sender<ScanProgress>,
    stats: &mut WalkStats,
) {
    warn!("skipping {}: {err}", path.display());
    stats.error_count += 1;
    let _ = progress_tx.send(ScanProgress::Error {
        path: path.to_string_lossy().into_owned(),
        message: err.to_string(),
    });
}

fn maybe_send_update(
    live_tree: &LiveTree,
    current: EntryId,
    progress_tx: &Sender<ScanProgress>,
    stats: &WalkStats,
) {
    if !stats.dirs_found.is_multiple_of(UPDATE_EVERY_FOLDERS) {
        return;
    }
    let current_path = live_tree
        .read()
        .entry(current)
        .path
        .to_string_lossy()
        .into_owned();
    let _ = progress_tx.send(ScanProgress::Update {
        files_found: stats.files_found,
        dirs_found: stats.dirs_found,
        total_size: stats.total_size,
        current_path,
    });
}

fn send_complete(start: Instant, stats: &WalkStats, progress_tx: &Sender<ScanProgress>) {
    let duration = start.elapsed();
    debug!(
        "walk complete: {} files, {} dirs, {} errors in {duration:?}",
        stats.files_found, stats.dirs_found, stats.error_count
    );
    let _ = progress_tx.send(ScanProgress::Complete {
        duration,
        error_count: stats.error_count,
    });
}
