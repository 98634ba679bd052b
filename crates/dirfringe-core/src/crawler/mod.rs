/// Crawler module — runs the traversal driver.
///
/// The traversal itself is strictly single-threaded. [`start_crawl`] moves the
/// whole [`Crawler`] onto one background thread so the caller can watch
/// progress and request cancellation; nothing else touches the traversal
/// state while it runs.
pub mod driver;
pub mod progress;

pub use driver::{CrawlSummary, Crawler};
pub use progress::CrawlProgress;

use crate::error::CrawlError;
use crate::platform::OwnerResolver;
use crate::sink::RecordSink;
use crossbeam_channel::Receiver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Maximum number of progress messages that may queue up in the channel.
///
/// Once full, the crawler blocks on `send` until the receiver catches up.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Handle to a running or completed crawl.
pub struct CrawlHandle {
    /// Receiver for progress updates. Disconnects when the crawl ends.
    pub progress_rx: Receiver<CrawlProgress>,
    cancel_flag: Arc<AtomicBool>,
    thread: thread::JoinHandle<Result<CrawlSummary, CrawlError>>,
}

impl CrawlHandle {
    /// Request the crawl to stop after the current entry. The pending batch
    /// is still written and the checkpoint saved.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    /// Wait for the crawl to end.
    ///
    /// Drain `progress_rx` first (or drop it): a full channel blocks the
    /// crawler thread.
    pub fn join(self) -> Result<CrawlSummary, CrawlError> {
        drop(self.progress_rx);
        self.thread.join().map_err(|_| CrawlError::Panicked)?
    }
}

/// Start `crawler` on a background thread.
pub fn start_crawl<S, O>(crawler: Crawler<S, O>) -> Result<CrawlHandle, CrawlError>
where
    S: RecordSink + Send + 'static,
    O: OwnerResolver + Send + 'static,
{
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<CrawlProgress>(PROGRESS_CHANNEL_CAPACITY);
    let mut crawler = crawler.with_progress(progress_tx);
    let cancel_flag = crawler.cancel_flag();

    let thread = thread::Builder::new()
        .name("dirfringe-crawler".into())
        .spawn(move || crawler.run())?;

    Ok(CrawlHandle {
        progress_rx,
        cancel_flag,
        thread,
    })
}
