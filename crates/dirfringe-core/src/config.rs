/// Run configuration and forest construction.
///
/// Everything here runs before traversal starts, so every error it returns is
/// a [`ConfigError`] and nothing has been written to the sink yet.
use crate::error::ConfigError;
use crate::filter::ExclusionMatcher;
use crate::model::{check_disjoint_roots, Forest};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Records per batch when none is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 100;
/// Checkpoint file used when none is configured.
pub const DEFAULT_CHECKPOINT: &str = "history.txt";
/// Static exclusion list used when none is configured.
pub const DEFAULT_EXCLUSION_LIST: &str = "exclude.txt";
/// Pattern file used when none is configured, if it exists.
pub const DEFAULT_PATTERN_FILE: &str = "regex.txt";

/// Everything a crawl needs to know before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    /// Absolute, pairwise disjoint directories, drained in this order.
    pub roots: Vec<PathBuf>,
    /// A batch is written once it holds more than this many records.
    pub chunk_size: usize,
    /// Read at startup, rewritten after every batch.
    pub checkpoint_path: PathBuf,
    /// Static exclusion lists, same format as the checkpoint.
    pub exclusion_lists: Vec<PathBuf>,
    /// Regular expressions, one per line. `None` disables pattern exclusion.
    pub pattern_file: Option<PathBuf>,
    /// Stop after this many files; the checkpoint lets the next run continue.
    pub max_files: Option<u64>,
}

impl CrawlConfig {
    /// Defaults for everything but the roots.
    ///
    /// The default pattern file is only used when it exists.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        let pattern_file = Path::new(DEFAULT_PATTERN_FILE);
        Self {
            roots,
            chunk_size: DEFAULT_CHUNK_SIZE,
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT),
            exclusion_lists: vec![PathBuf::from(DEFAULT_EXCLUSION_LIST)],
            pattern_file: pattern_file.exists().then(|| pattern_file.to_path_buf()),
            max_files: None,
        }
    }

    /// Check the parts that do not need any file access.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        check_disjoint_roots(&self.roots)
    }

    /// Compile the pattern file, or an empty matcher when there is none.
    pub fn load_matcher(&self) -> Result<ExclusionMatcher, ConfigError> {
        match &self.pattern_file {
            Some(path) => {
                let matcher = ExclusionMatcher::from_file(path)?;
                info!(file = %path.display(), "Exclusion patterns loaded");
                Ok(matcher)
            }
            None => {
                debug!("No pattern file configured");
                Ok(ExclusionMatcher::empty())
            }
        }
    }

    /// Build the traversal state for this run.
    ///
    /// The previous checkpoint is replayed first, then each static exclusion
    /// list is applied. Missing checkpoint and list files count as empty.
    pub fn build_forest(&self) -> Result<Forest, ConfigError> {
        self.validate()?;
        let matcher = self.load_matcher()?;
        let mut forest = Forest::new(&self.roots, matcher)?;

        forest.resume_from_file(&self.checkpoint_path)?;
        for list in &self.exclusion_lists {
            forest.exclude_from_file(list)?;
        }

        let stats = forest.stats();
        info!(
            roots = stats.roots,
            live_nodes = stats.live_nodes,
            "Traversal state ready"
        );
        Ok(forest)
    }
}
