/// The traversal driver — drains the forest into the sink in batches.
///
/// # Durability ordering
///
/// A checkpoint is only ever written right after the sink accepted a batch,
/// and it is serialized from the forest state at that moment. Every entry the
/// forest has handed out by then is in the sink, so a resumed run can skip
/// whatever the checkpoint names without losing anything. Entries pulled after
/// the last checkpoint are simply emitted again on the next run; the sink
/// ignores the duplicates.
use super::progress::CrawlProgress;
use crate::checkpoint;
use crate::config::CrawlConfig;
use crate::error::CrawlError;
use crate::model::Forest;
use crate::platform::OwnerResolver;
use crate::record::FileRecord;
use crate::sink::RecordSink;
use crossbeam_channel::Sender;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Send a progress update every this many pulled entries.
const UPDATE_INTERVAL: u64 = 5_000;

/// Totals for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Leaf entries handed to the sink.
    pub files: u64,
    /// Sum of their sizes.
    pub bytes: u64,
    /// Batches written.
    pub batches: u64,
    /// Recoverable per-entry errors skipped.
    pub errors: u64,
    /// Lines in the last checkpoint written.
    pub checkpoint_lines: usize,
    pub duration: Duration,
    /// `false` when the run stopped early (cancel or file limit).
    pub completed: bool,
}

/// Single-threaded crawl over one [`Forest`].
pub struct Crawler<S, O> {
    forest: Forest,
    sink: S,
    owners: O,
    checkpoint_path: PathBuf,
    chunk_size: usize,
    max_files: Option<u64>,
    cancel_flag: Arc<AtomicBool>,
    progress_tx: Option<Sender<CrawlProgress>>,
}

impl<S: RecordSink, O: OwnerResolver> Crawler<S, O> {
    pub fn new(config: &CrawlConfig, forest: Forest, sink: S, owners: O) -> Self {
        Self {
            forest,
            sink,
            owners,
            checkpoint_path: config.checkpoint_path.clone(),
            chunk_size: config.chunk_size,
            max_files: config.max_files,
            cancel_flag: Arc::new(AtomicBool::new(false)),
            progress_tx: None,
        }
    }

    /// Report progress on `tx`.
    pub fn with_progress(mut self, tx: Sender<CrawlProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Share an existing cancellation flag (e.g. one set by a signal handler).
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = flag;
        self
    }

    /// Setting this flag stops the crawl after the current entry.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel_flag.clone()
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Give back the traversal state and the sink.
    pub fn into_parts(self) -> (Forest, S) {
        (self.forest, self.sink)
    }

    /// Drain the forest into the sink.
    ///
    /// Per-entry errors are logged and skipped. Sink and checkpoint failures
    /// abort the run; the last checkpoint on disk stays valid.
    pub fn run(&mut self) -> Result<CrawlSummary, CrawlError> {
        let start = Instant::now();
        let mut summary = CrawlSummary::default();

        self.sink.init()?;
        info!(
            roots = self.forest.root_paths().count(),
            chunk_size = self.chunk_size,
            "Crawl starting"
        );

        let mut batch: Vec<FileRecord> = Vec::with_capacity(self.chunk_size + 1);
        let mut update_counter: u64 = 0;
        let mut stopped_early = false;

        loop {
            if self.should_stop(summary.files) {
                stopped_early = true;
                break;
            }
            let Some(item) = self.forest.next_entry() else {
                break;
            };

            update_counter += 1;
            match item {
                Ok(entry) => {
                    let record = FileRecord::from_entry(&entry, &self.owners);
                    summary.files += 1;
                    summary.bytes += record.size;
                    batch.push(record);

                    if batch.len() > self.chunk_size {
                        self.flush(&mut batch, &mut summary)?;
                    }

                    if update_counter % UPDATE_INTERVAL == 0 {
                        self.report(CrawlProgress::Update {
                            files_found: summary.files,
                            error_count: summary.errors,
                            live_nodes: self.forest.stats().live_nodes,
                            current_path: entry.path.to_string_lossy().into_owned(),
                        });
                    }
                }
                Err(err) => {
                    summary.errors += 1;
                    warn!("Skipping: {err}");
                    self.report(CrawlProgress::Error {
                        path: err.path().to_string_lossy().into_owned(),
                        message: err.to_string(),
                    });
                }
            }
        }

        // Final flush and checkpoint, whether or not the crawl finished.
        self.flush(&mut batch, &mut summary)?;

        summary.duration = start.elapsed();
        summary.completed = !stopped_early;

        if summary.completed {
            info!(
                files = summary.files,
                errors = summary.errors,
                duration = ?summary.duration,
                "Crawl complete"
            );
            self.report(CrawlProgress::Complete {
                duration: summary.duration,
                files_found: summary.files,
                error_count: summary.errors,
            });
        } else {
            info!(files = summary.files, "Crawl stopped early; checkpoint saved");
            self.report(CrawlProgress::Cancelled {
                files_found: summary.files,
            });
        }

        Ok(summary)
    }

    fn should_stop(&self, files: u64) -> bool {
        if self.cancel_flag.load(Ordering::Relaxed) {
            return true;
        }
        matches!(self.max_files, Some(limit) if files >= limit)
    }

    /// Write the pending batch (if any), then rewrite the checkpoint.
    fn flush(
        &mut self,
        batch: &mut Vec<FileRecord>,
        summary: &mut CrawlSummary,
    ) -> Result<(), CrawlError> {
        if !batch.is_empty() {
            self.sink.write_batch(batch)?;
            summary.batches += 1;
            debug!(records = batch.len(), "Batch written");
            batch.clear();
        }

        summary.checkpoint_lines = checkpoint::save(&self.forest, &self.checkpoint_path)?;
        self.report(CrawlProgress::Checkpoint {
            files_committed: summary.files,
            lines: summary.checkpoint_lines,
        });
        Ok(())
    }

    fn report(&self, msg: CrawlProgress) {
        if let Some(tx) = &self.progress_tx {
            let _ = tx.send(msg);
        }
    }
}
