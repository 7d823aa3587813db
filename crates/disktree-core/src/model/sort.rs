/// Presentation ordering for entries.
use super::entry::EntryId;
use super::tree::EntryTree;

/// Criterion for ordering sibling entries in a rendered tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortBy {
    /// Ascending lexicographic order on the entry name.
    Name,
    /// Descending order on aggregate size, with an ascending name tiebreak
    /// so equal-sized entries come out in a deterministic order.
    Size,
}

/// Sort a slice of entry ids in place by the given criterion.
///
/// Stable sort; the `Size` criterion breaks ties by name so repeated renders
/// of a still-growing tree don't shuffle equal-sized siblings around.
pub fn sort_entries(tree: &EntryTree, sort_by: SortBy, ids: &mut [EntryId]) {
    match sort_by {
        SortBy::Name => {
            ids.sort_by(|&a, &b| tree.entry(a).name.cmp(&tree.entry(b).name));
        }
        SortBy::Size => {
            ids.sort_by(|&a, &b| {
                tree.entry(b)
                    .size
                    .cmp(&tree.entry(a).size)
                    .then_with(|| tree.entry(a).name.cmp(&tree.entry(b).name))
            });
        }
    }
}
