/// Arena-backed entry tree with incremental upward size aggregation.
///
/// All entries live in a single `Vec<Entry>`. Relationships between entries
/// use `EntryId` (a thin `u32` wrapper) rather than heap pointers, giving
/// cache-friendly traversal and no ownership cycle for the parent
/// back-reference.
///
/// The tree is mutated only by the scan worker; concurrent readers see a
/// structure that grows append-only. Child collections are never reordered
/// or truncated during a scan, and `size` fields only ever increase, so a
/// reader's snapshot is at worst stale, never corrupt.
use super::entry::{Entry, EntryId, EntryState, ListError};
use super::sort::{sort_entries, SortBy};
use compact_str::CompactString;
use std::path::PathBuf;

/// The complete entry tree for one scan run.
///
/// A new scan prepares a fresh tree; entries are never shared across runs.
#[derive(Debug, Clone)]
pub struct EntryTree {
    /// Arena: every entry in a flat, cache-friendly vector. Index 0 is the root.
    pub entries: Vec<Entry>,

    /// The root folder entry.
    root: EntryId,
}

impl EntryTree {
    /// Construct a tree holding only the root folder entry for `root_path`.
    ///
    /// Pure constructor — no filesystem access happens here, so a caller can
    /// obtain a renderable (empty, `Unprocessed`) root before the scan
    /// thread has done any work. The root's `name` is its full path string;
    /// all other entries are named by their final path segment.
    pub fn prepare(root_path: impl Into<PathBuf>) -> Self {
        let path = root_path.into();
        let name = CompactString::new(path.to_string_lossy());
        let root_entry = Entry::new_folder(path, name, None);
        Self {
            entries: vec![root_entry],
            root: EntryId::new(0),
        }
    }

    /// The root folder entry's id.
    #[inline]
    pub fn root(&self) -> EntryId {
        self.root
    }

    /// Get the entry at the given id.
    #[inline]
    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id.idx()]
    }

    /// Total number of entries in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree holds only the root entry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Append a file child to `parent` and add its length to the parent's
    /// running size.
    ///
    /// Only the direct parent is touched here — propagation to further
    /// ancestors happens once, in bulk, when the parent's listing finishes
    /// (see [`finish_listing`](Self::finish_listing)).
    pub fn add_file(
        &mut self,
        parent: EntryId,
        path: PathBuf,
        name: CompactString,
        len: u64,
    ) -> EntryId {
        let id = EntryId::new(self.entries.len());
        self.entries.push(Entry::new_file(path, name, len, parent));
        let parent_entry = &mut self.entries[parent.idx()];
        parent_entry.files.push(id);
        parent_entry.size += len;
        id
    }

    /// Append an `Unprocessed` folder child to `parent`.
    ///
    /// The parent's pending-subfolder count is bumped; it drops back when
    /// the child's whole subtree reaches a terminal state.
    pub fn add_folder(&mut self, parent: EntryId, path: PathBuf, name: CompactString) -> EntryId {
        let id = EntryId::new(self.entries.len());
        self.entries
            .push(Entry::new_folder(path, name, Some(parent)));
        let parent_entry = &mut self.entries[parent.idx()];
        parent_entry.folders.push(id);
        parent_entry.pending_folders += 1;
        id
    }

    /// Mark a folder as actively being listed.
    ///
    /// Moves the folder from `Unprocessed` to `Processing` and bubbles the
    /// activity up the parent chain, so the root (and every enclosing
    /// folder) visibly shows activity whenever any descendant is
    /// mid-listing. The bubble is a bounded loop over parent ids, not an
    /// event system.
    pub fn begin_listing(&mut self, id: EntryId) {
        let entry = &mut self.entries[id.idx()];
        debug_assert_eq!(entry.state, EntryState::Unprocessed, "listing started twice");
        entry.state = EntryState::Processing;

        let mut current = Some(id);
        while let Some(c) = current {
            let e = &mut self.entries[c.idx()];
            e.active_listings += 1;
            current = e.parent;
        }
    }

    /// Record the outcome of a folder's listing step.
    ///
    /// In order:
    /// 1. Un-bubbles the activity counter set by
    ///    [`begin_listing`](Self::begin_listing), so ancestors revert to
    ///    their previous resting state.
    /// 2. Adds this folder's direct-file total once to every ancestor's
    ///    running `size`. Each ancestor is touched exactly once per
    ///    descendant folder's listing — never re-summed from scratch.
    ///    Partial sizes collected before a failure are propagated too.
    /// 3. Resolves terminal state. On failure the folder goes to `Error`
    ///    immediately (no subfolders were recorded, so nothing below is
    ///    pending). On success it goes to `Processed` as soon as all its
    ///    discovered subfolders are terminal as well; completion cascades up
    ///    the parent chain. This ordering is what lets a reader who observes
    ///    `Processed` rely on `size` being final.
    pub fn finish_listing(&mut self, id: EntryId, result: Result<(), ListError>) {
        // Un-bubble activity.
        let mut current = Some(id);
        while let Some(c) = current {
            let e = &mut self.entries[c.idx()];
            debug_assert!(e.active_listings > 0, "activity bubble underflow");
            e.active_listings -= 1;
            current = e.parent;
        }

        // Propagate the direct-file total collected during this listing.
        let contribution = self.entries[id.idx()].size;
        let mut ancestor = self.entries[id.idx()].parent;
        while let Some(a) = ancestor {
            let e = &mut self.entries[a.idx()];
            e.size += contribution;
            ancestor = e.parent;
        }

        let entry = &mut self.entries[id.idx()];
        entry.listed = true;
        match result {
            Ok(()) => self.resolve_completion(id),
            Err(err) => {
                entry.error = Some(err);
                entry.state = EntryState::Error;
                if let Some(parent) = entry.parent {
                    self.entries[parent.idx()].pending_folders -= 1;
                    self.resolve_completion(parent);
                }
            }
        }
    }

    /// Walk up from `id`, marking every folder whose own listing is done and
    /// whose subfolders are all terminal as `Processed`.
    ///
    /// Stops at the first folder that is still waiting on descendants (or
    /// that already ended in `Error`). Under cancellation the cascade simply
    /// never reaches the waiting ancestors — they stay `Processing`, which
    /// keeps the `Processed => size is final` guarantee intact.
    fn resolve_completion(&mut self, mut id: EntryId) {
        loop {
            let entry = &mut self.entries[id.idx()];
            if !entry.listed
                || entry.pending_folders > 0
                || entry.state != EntryState::Processing
            {
                return;
            }
            entry.state = EntryState::Processed;
            match entry.parent {
                Some(parent) => {
                    self.entries[parent.idx()].pending_folders -= 1;
                    id = parent;
                }
                None => return,
            }
        }
    }

    /// Resolve a `/`-delimited relative path from `from`, returning the
    /// deepest matched entry.
    ///
    /// At each level files are checked before folders, and a file match
    /// resolves immediately. A segment with no match falls back to the last
    /// successfully matched folder — deliberately lenient, because
    /// presentation code reconstructs entries from path identifiers while
    /// the tree is still growing and a segment may simply not exist yet.
    pub fn child_from_path(&self, from: EntryId, relative: &str) -> EntryId {
        let mut current = from;
        for segment in relative.split('/') {
            let entry = self.entry(current);
            if let Some(&file) = entry
                .files
                .iter()
                .find(|&&f| self.entry(f).name == segment)
            {
                return file;
            }
            if let Some(&folder) = entry
                .folders
                .iter()
                .find(|&&d| self.entry(d).name == segment)
            {
                current = folder;
            }
        }
        current
    }

    /// Direct children of `id` ordered for rendering.
    ///
    /// With `separate_folders_first` the folders and files are sorted
    /// independently and folders listed first; otherwise all children are
    /// sorted together.
    pub fn children_sorted(
        &self,
        id: EntryId,
        sort_by: SortBy,
        separate_folders_first: bool,
    ) -> Vec<EntryId> {
        if separate_folders_first {
            let mut folders = self.entry(id).folders.clone();
            let mut files = self.entry(id).files.clone();
            sort_entries(self, sort_by, &mut folders);
            sort_entries(self, sort_by, &mut files);
            folders.extend(files);
            folders
        } else {
            let mut children = self.entry(id).folders.clone();
            children.extend_from_slice(&self.entry(id).files);
            sort_entries(self, sort_by, &mut children);
            children
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive the state machine by hand the way the scanner does, without
    /// touching a real filesystem.
    fn folder(tree: &mut EntryTree, parent: EntryId, name: &str) -> EntryId {
        let path = tree.entry(parent).path.join(name);
        tree.add_folder(parent, path, CompactString::new(name))
    }

    fn file(tree: &mut EntryTree, parent: EntryId, name: &str, len: u64) -> EntryId {
        let path = tree.entry(parent).path.join(name);
        tree.add_file(parent, path, CompactString::new(name), len)
    }

    #[test]
    fn prepare_is_pure_and_names_root_by_full_path() {
        let tree = EntryTree::prepare("/some/where");
        let root = tree.entry(tree.root());
        assert_eq!(root.name, "/some/where");
        assert_eq!(root.state, EntryState::Unprocessed);
        assert_eq!(root.size, 0);
        assert!(root.is_folder);
        assert!(tree.is_empty());
    }

    #[test]
    fn sizes_aggregate_upward_once_per_folder_completion() {
        // root { f1: 100, d1 { f2: 50, d2 { f3: 7 } } }
        let mut tree = EntryTree::prepare("/x");
        let root = tree.root();

        tree.begin_listing(root);
        file(&mut tree, root, "f1", 100);
        let d1 = folder(&mut tree, root, "d1");
        tree.finish_listing(root, Ok(()));

        tree.begin_listing(d1);
        file(&mut tree, d1, "f2", 50);
        let d2 = folder(&mut tree, d1, "d2");
        tree.finish_listing(d1, Ok(()));

        tree.begin_listing(d2);
        file(&mut tree, d2, "f3", 7);
        tree.finish_listing(d2, Ok(()));

        assert_eq!(tree.entry(d2).size, 7);
        assert_eq!(tree.entry(d1).size, 57);
        assert_eq!(tree.entry(root).size, 157);
    }

    #[test]
    fn processed_is_reached_only_when_the_whole_subtree_is_terminal() {
        let mut tree = EntryTree::prepare("/x");
        let root = tree.root();

        tree.begin_listing(root);
        let d1 = folder(&mut tree, root, "d1");
        tree.finish_listing(root, Ok(()));

        // Root's own listing is done but d1 is still pending.
        assert_eq!(tree.entry(root).state, EntryState::Processing);
        assert_eq!(tree.entry(d1).state, EntryState::Unprocessed);

        tree.begin_listing(d1);
        tree.finish_listing(d1, Ok(()));

        assert_eq!(tree.entry(d1).state, EntryState::Processed);
        assert_eq!(tree.entry(root).state, EntryState::Processed);
    }

    #[test]
    fn activity_bubbles_to_ancestors_and_reverts() {
        let mut tree = EntryTree::prepare("/x");
        let root = tree.root();

        tree.begin_listing(root);
        let d1 = folder(&mut tree, root, "d1");
        tree.finish_listing(root, Ok(()));
        assert!(!tree.entry(root).is_busy());

        tree.begin_listing(d1);
        // Every ancestor of an actively-listed folder shows activity.
        assert!(tree.entry(d1).is_busy());
        assert!(tree.entry(root).is_busy());
        assert_eq!(tree.entry(root).display_state(), EntryState::Processing);

        tree.finish_listing(d1, Ok(()));
        assert!(!tree.entry(d1).is_busy());
        assert!(!tree.entry(root).is_busy());
        assert_eq!(tree.entry(root).display_state(), EntryState::Processed);
    }

    #[test]
    fn failed_listing_keeps_partial_sizes_and_records_the_error() {
        let mut tree = EntryTree::prepare("/x");
        let root = tree.root();

        tree.begin_listing(root);
        file(&mut tree, root, "seen-before-failure", 30);
        tree.finish_listing(
            root,
            Err(ListError {
                kind: std::io::ErrorKind::PermissionDenied,
                message: "permission denied".into(),
            }),
        );

        let root_entry = tree.entry(root);
        assert_eq!(root_entry.state, EntryState::Error);
        assert_eq!(root_entry.size, 30);
        assert_eq!(
            root_entry.error.as_ref().map(|e| e.kind),
            Some(std::io::ErrorKind::PermissionDenied)
        );
    }

    #[test]
    fn error_subfolder_completes_its_parent() {
        let mut tree = EntryTree::prepare("/x");
        let root = tree.root();

        tree.begin_listing(root);
        let d1 = folder(&mut tree, root, "d1");
        tree.finish_listing(root, Ok(()));

        tree.begin_listing(d1);
        tree.finish_listing(
            d1,
            Err(ListError {
                kind: std::io::ErrorKind::PermissionDenied,
                message: "denied".into(),
            }),
        );

        // Error is terminal, so the parent no longer waits on d1.
        assert_eq!(tree.entry(d1).state, EntryState::Error);
        assert_eq!(tree.entry(root).state, EntryState::Processed);
    }

    #[test]
    fn child_from_path_resolves_nested_files() {
        let mut tree = EntryTree::prepare("/x");
        let root = tree.root();
        let a = folder(&mut tree, root, "a");
        let b = folder(&mut tree, a, "b");
        let c = file(&mut tree, b, "c", 1);

        assert_eq!(tree.child_from_path(root, "a/b/c"), c);
        assert_eq!(tree.child_from_path(root, "a/b"), b);
        assert_eq!(tree.child_from_path(root, "a"), a);
    }

    #[test]
    fn child_from_path_falls_back_to_deepest_matched_folder() {
        // Intentional leniency: an unmatched trailing segment returns the
        // last folder that did match, because lookups run against a tree
        // that may not have grown that far yet.
        let mut tree = EntryTree::prepare("/x");
        let root = tree.root();
        let a = folder(&mut tree, root, "a");
        let b = folder(&mut tree, a, "b");

        assert_eq!(tree.child_from_path(root, "a/b/not-yet-scanned"), b);
        assert_eq!(tree.child_from_path(root, "no/such/path"), root);
    }

    #[test]
    fn child_from_path_checks_files_before_folders() {
        // A file match resolves immediately, even with segments remaining.
        let mut tree = EntryTree::prepare("/x");
        let root = tree.root();
        let twin_file = file(&mut tree, root, "twin", 1);
        let twin_dir = folder(&mut tree, root, "twin");
        folder(&mut tree, twin_dir, "inner");

        assert_eq!(tree.child_from_path(root, "twin/inner"), twin_file);
    }

    #[test]
    fn children_sorted_separates_folders_when_asked() {
        let mut tree = EntryTree::prepare("/x");
        let root = tree.root();
        let big_file = file(&mut tree, root, "big", 500);
        let dir = folder(&mut tree, root, "dir");
        let small_file = file(&mut tree, root, "small", 10);

        let separated = tree.children_sorted(root, SortBy::Size, true);
        assert_eq!(separated, vec![dir, big_file, small_file]);

        let merged = tree.children_sorted(root, SortBy::Size, false);
        assert_eq!(merged, vec![big_file, small_file, dir]);
    }
}
