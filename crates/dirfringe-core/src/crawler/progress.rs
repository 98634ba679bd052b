/// Crawl progress reporting — lightweight messages sent from the crawler
/// thread to whoever holds the [`CrawlHandle`](super::CrawlHandle).
use std::time::Duration;

/// Progress updates sent from the crawler thread.
#[derive(Debug)]
pub enum CrawlProgress {
    /// Periodic update with running totals.
    Update {
        files_found: u64,
        error_count: u64,
        live_nodes: usize,
        current_path: String,
    },
    /// A non-fatal error (e.g. permission denied on one directory).
    Error { path: String, message: String },
    /// A batch reached the sink and the checkpoint was rewritten.
    Checkpoint {
        files_committed: u64,
        lines: usize,
    },
    /// Every root has been drained.
    Complete {
        duration: Duration,
        files_found: u64,
        error_count: u64,
    },
    /// The crawl stopped early on request. The checkpoint is up to date.
    Cancelled { files_found: u64 },
}
