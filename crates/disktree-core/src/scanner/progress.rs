/// Scan progress reporting — lightweight messages sent from the scan
/// thread to the caller via a crossbeam channel.

use std::time::Duration;

/// Progress updates sent from the scan thread to the caller.
///
/// The actual tree data is in the shared `LiveTree`; these messages
/// carry only lightweight counters and status flags.
#[derive(Debug)]
pub enum ScanProgress {
    /// Periodic update with running totals.
    Update {
        files_found: u64,
        dirs_found: u64,
        total_size: u64,
        current_path: String,
    },
    /// A non-fatal error (e.g. permission denied on one folder). The error
    /// is also recorded on the affected entry in the live tree.
    Error {
        path: String,
        message: String,
    },
    /// The traversal finished; every reachable folder is terminal.
    Complete {
        duration: Duration,
        error_count: u64,
    },
    /// Scan was cancelled by the caller. Sizes already aggregated stay valid.
    Cancelled,
}
