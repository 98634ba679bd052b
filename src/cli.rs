/// Command-line arguments.
///
/// Every option can also come from a `DIRFRINGE_*` environment variable.
/// Path values are never split on commas. `DIRFRINGE_ROOTS` is a path list
/// in the platform's `PATH` format (`:`-separated on Unix, `;` on Windows).
use clap::Parser;
use dirfringe_core::config::{
    CrawlConfig, DEFAULT_CHECKPOINT, DEFAULT_CHUNK_SIZE, DEFAULT_EXCLUSION_LIST,
};
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Roots used when none are given on the command line.
pub const ROOTS_ENV: &str = "DIRFRINGE_ROOTS";

/// Record every file under a set of directories into SQLite, resumably.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dirfringe",
    version,
    about = "Resumable file inventory crawler with SQLite output",
    after_help = "EXAMPLES:\n    \
        dirfringe /srv/share -o inventory.db\n    \
        dirfringe /data /home --exclude-list skip.txt --chunk-size 500\n    \
        dirfringe /data --dry-run -v"
)]
pub struct CliArgs {
    /// Absolute directories to crawl. Must not contain one another.
    /// [env: DIRFRINGE_ROOTS, a platform path list]
    #[arg(value_name = "ROOT")]
    pub roots: Vec<PathBuf>,

    /// Checkpoint file: read at startup, rewritten after every batch
    #[arg(long, default_value = DEFAULT_CHECKPOINT, env = "DIRFRINGE_CHECKPOINT", value_name = "FILE")]
    pub checkpoint: PathBuf,

    /// Static exclusion list, one absolute path per line (can be repeated)
    #[arg(
        long = "exclude-list",
        value_name = "FILE",
        default_value = DEFAULT_EXCLUSION_LIST,
        env = "DIRFRINGE_EXCLUDE_LIST",
        action = clap::ArgAction::Append
    )]
    pub exclude_lists: Vec<PathBuf>,

    /// Regular expressions matched against full directory paths, one per line
    /// [default: regex.txt when present]
    #[arg(long, env = "DIRFRINGE_PATTERNS", value_name = "FILE")]
    pub patterns: Option<PathBuf>,

    /// Records per database transaction
    #[arg(short = 'c', long, default_value_t = DEFAULT_CHUNK_SIZE, env = "DIRFRINGE_CHUNK_SIZE", value_name = "NUM")]
    pub chunk_size: usize,

    /// Stop after this many files; rerun to continue
    #[arg(long, env = "DIRFRINGE_MAX_FILES", value_name = "NUM")]
    pub max_files: Option<u64>,

    /// Output SQLite database
    #[arg(short, long, default_value = "files.db", env = "DIRFRINGE_OUTPUT", value_name = "FILE")]
    pub output: PathBuf,

    /// SQL run against the database before crawling, instead of the built-in schema
    #[arg(long, env = "DIRFRINGE_INIT_SQL", value_name = "FILE")]
    pub init_sql: Option<PathBuf>,

    /// Keep records in memory instead of writing the database. Progress goes
    /// to `<checkpoint>.dry-run`, leaving the real checkpoint untouched.
    #[arg(long)]
    pub dry_run: bool,

    /// Debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Turn the arguments into a crawl configuration.
    ///
    /// Relative roots are kept as given; validation rejects them, as it
    /// rejects an empty root list.
    pub fn to_config(&self) -> CrawlConfig {
        self.to_config_with_env_roots(env::var_os(ROOTS_ENV))
    }

    /// Like [`to_config`](Self::to_config), with the value of
    /// `DIRFRINGE_ROOTS` passed in. It is only consulted when no roots were
    /// given on the command line.
    pub fn to_config_with_env_roots(&self, env_roots: Option<OsString>) -> CrawlConfig {
        let roots = if self.roots.is_empty() {
            env_roots
                .map(|list| {
                    env::split_paths(&list)
                        .filter(|p| !p.as_os_str().is_empty())
                        .collect()
                })
                .unwrap_or_default()
        } else {
            self.roots.clone()
        };

        let mut config = CrawlConfig::new(roots);
        config.chunk_size = self.chunk_size;
        config.checkpoint_path = self.checkpoint.clone();
        config.exclusion_lists = self.exclude_lists.clone();
        config.max_files = self.max_files;
        if let Some(patterns) = &self.patterns {
            config.pattern_file = Some(patterns.clone());
        }
        config
    }
}
