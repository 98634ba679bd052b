/// Error types for the crawler core.
///
/// Errors fall into three groups:
/// - [`ConfigError`]: fatal, raised before any traversal state exists.
/// - [`EntryError`]: recoverable, one unreadable directory or file. The
///   crawler logs it and moves on; the entry is retried on the next run.
/// - [`SinkError`] / [`CheckpointError`]: fatal once traversal has started.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid configuration. Always detected before traversal starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No roots were configured.
    #[error("no root directories configured")]
    NoRoots,

    /// A root path is not absolute.
    #[error("root '{0}' is not an absolute path")]
    RelativeRoot(PathBuf),

    /// The same root appears twice.
    #[error("root '{0}' is listed more than once")]
    DuplicateRoot(PathBuf),

    /// One root lies inside another.
    #[error("root '{inner}' is nested inside root '{outer}'; roots must be disjoint")]
    NestedRoots { outer: PathBuf, inner: PathBuf },

    /// An exclusion request names a root directory itself.
    #[error("cannot exclude root directory '{0}' in its entirety")]
    ExcludesRoot(PathBuf),

    /// The exclusion pattern set failed to compile.
    #[error("invalid exclusion pattern set: {0}")]
    Pattern(#[from] regex::Error),

    /// A configuration file (pattern file, exclusion list) could not be read.
    #[error("failed to read '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Batch size must be positive.
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
}

/// A recoverable failure on a single filesystem entry.
#[derive(Error, Debug)]
pub enum EntryError {
    /// A directory listing could not be opened (permission denied, removed).
    #[error("cannot open directory '{path}': {source}")]
    OpenDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the next entry out of an open listing failed.
    #[error("cannot read entry in '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Stat of an individual entry failed.
    #[error("cannot stat '{path}': {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EntryError {
    /// The path the error refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::OpenDir { path, .. } | Self::ReadDir { path, .. } | Self::Stat { path, .. } => {
                path
            }
        }
    }
}

/// Sink write or initialisation failure. Terminates the run.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// The checkpoint could not be written or read.
#[derive(Error, Debug)]
#[error("checkpoint '{path}': {source}")]
pub struct CheckpointError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Umbrella error returned by a crawl run.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The crawler thread panicked.
    #[error("crawler thread panicked")]
    Panicked,
}
