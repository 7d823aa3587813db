//! disktree — console disk space scanner.
//!
//! Thin binary entry point. All logic lives in the `disktree-core` crate;
//! this frontend only feeds it a start path, relays progress, and renders
//! the finished tree.

use disktree_core::model::{size, EntryId, EntryState, EntryTree, SortBy};
use disktree_core::scanner::progress::ScanProgress;
use disktree_core::scanner::{start_scan, Traversal};
use std::path::PathBuf;

struct Args {
    path: PathBuf,
    traversal: Traversal,
    /// Optional `/`-delimited path relative to the root; the summary is
    /// rendered from the matching entry instead of the root.
    focus: Option<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut path = None;
    let mut traversal = Traversal::default();
    let mut focus = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--depth-first" => traversal = Traversal::DepthFirst,
            "--focus" => {
                focus = Some(
                    args.next()
                        .ok_or_else(|| anyhow::anyhow!("--focus requires a relative path"))?,
                );
            }
            flag if flag.starts_with('-') => {
                anyhow::bail!("unknown option: {flag}\nusage: disktree [--depth-first] [--focus REL/PATH] [PATH]");
            }
            positional => {
                anyhow::ensure!(path.is_none(), "more than one path given");
                path = Some(PathBuf::from(positional));
            }
        }
    }

    Ok(Args {
        path: path.unwrap_or_else(|| PathBuf::from(".")),
        traversal,
        focus,
    })
}

fn main() -> anyhow::Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = parse_args()?;
    tracing::info!("disktree starting");

    let handle = start_scan(args.path, args.traversal);
    loop {
        match handle.progress_rx.recv() {
            Ok(ScanProgress::Update {
                files_found,
                dirs_found,
                total_size,
                current_path,
            }) => {
                tracing::info!(
                    "{} folders, {} files, {} — {current_path}",
                    size::format_count(dirs_found),
                    size::format_count(files_found),
                    size::format_size(total_size),
                );
            }
            Ok(ScanProgress::Error { path, message }) => {
                tracing::warn!("{path}: {message}");
            }
            Ok(ScanProgress::Complete {
                duration,
                error_count,
            }) => {
                tracing::info!("scan finished in {duration:?} ({error_count} errors)");
                break;
            }
            Ok(ScanProgress::Cancelled) => {
                tracing::info!("scan cancelled");
                break;
            }
            // Worker thread is gone; whatever is in the tree is final.
            Err(_) => break,
        }
    }

    let tree = handle.live_tree.read();
    let top = match &args.focus {
        Some(rel) => tree.child_from_path(tree.root(), rel),
        None => tree.root(),
    };
    render(&tree, top, 0);

    Ok(())
}

/// Print an entry and its two largest levels of children, biggest first,
/// folders before files.
fn render(tree: &EntryTree, id: EntryId, depth: usize) {
    let entry = tree.entry(id);
    let marker = match entry.state {
        EntryState::Error => "  [unreadable]",
        EntryState::Unprocessed => "  [not scanned]",
        EntryState::Processing => "  [partial]",
        EntryState::Processed => "",
    };
    println!(
        "{:indent$}{}  {}{marker}",
        "",
        entry.name,
        size::format_size(entry.size),
        indent = depth * 2
    );
    if entry.is_folder && depth < 2 {
        for child in tree.children_sorted(id, SortBy::Size, true) {
            render(tree, child, depth + 1);
        }
    }
}
