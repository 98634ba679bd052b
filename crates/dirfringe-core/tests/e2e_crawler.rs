/// End-to-end crawler tests.
///
/// These run the real driver against real temporary trees: forest
/// construction from a config, lazy listing, batching, checkpoint files on
/// disk, and resumption from them. Listing order is whatever the filesystem
/// returns, so assertions compare sets of paths.
use dirfringe_core::checkpoint;
use dirfringe_core::config::CrawlConfig;
use dirfringe_core::crawler::{start_crawl, CrawlProgress, Crawler};
use dirfringe_core::model::RawEntry;
use dirfringe_core::sink::{MemorySink, SqliteSink};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn write_bytes(path: &Path, n: usize) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

/// ```text
/// r/
///   a.txt
///   sub/
///     b.txt
///     c.txt
/// ```
fn build_small_tree(root: &Path) {
    fs::create_dir_all(root.join("sub")).unwrap();
    write_bytes(&root.join("a.txt"), 10);
    write_bytes(&root.join("sub/b.txt"), 20);
    write_bytes(&root.join("sub/c.txt"), 30);
}

/// ```text
/// r/
///   d1/ f1 f2
///   d2/ f3 f4
///   d3/ f5 f6
/// ```
fn build_three_dirs(root: &Path) -> BTreeSet<PathBuf> {
    let mut all = BTreeSet::new();
    for (dir, files) in [("d1", ["f1", "f2"]), ("d2", ["f3", "f4"]), ("d3", ["f5", "f6"])] {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        for file in files {
            write_bytes(&dir.join(file), 1);
            all.insert(dir.join(file));
        }
    }
    all
}

/// A config whose state files live in `state`, not in the crawled tree.
fn config(state: &Path, roots: Vec<PathBuf>) -> CrawlConfig {
    CrawlConfig {
        roots,
        chunk_size: 100,
        checkpoint_path: state.join("history.txt"),
        exclusion_lists: vec![state.join("exclude.txt")],
        pattern_file: None,
        max_files: None,
    }
}

fn owners() -> impl Fn(&RawEntry) -> String + Send + 'static {
    |_: &RawEntry| "tester".to_string()
}

fn emitted(sink: &MemorySink) -> BTreeSet<PathBuf> {
    sink.records()
        .map(|r| Path::new(&r.parent).join(r.name.as_str()))
        .collect()
}

fn run_memory(config: &CrawlConfig) -> (MemorySink, dirfringe_core::crawler::CrawlSummary) {
    let forest = config.build_forest().unwrap();
    let mut crawler = Crawler::new(config, forest, MemorySink::new(), owners());
    let summary = crawler.run().unwrap();
    let (_, sink) = crawler.into_parts();
    (sink, summary)
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[test]
fn test_full_crawl_emits_everything_and_checkpoints_finished_dir() {
    let state = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    let root = tree.path().join("r");
    build_small_tree(&root);
    let config = config(state.path(), vec![root.clone()]);

    let (sink, summary) = run_memory(&config);

    assert_eq!(
        emitted(&sink),
        BTreeSet::from([
            root.join("a.txt"),
            root.join("sub/b.txt"),
            root.join("sub/c.txt"),
        ])
    );
    assert_eq!(summary.files, 3);
    assert_eq!(summary.bytes, 60);
    assert_eq!(summary.errors, 0);
    assert!(summary.completed);
    assert!(sink.initialised);

    let text = fs::read_to_string(&config.checkpoint_path).unwrap();
    assert_eq!(text, format!("{}\n", root.join("sub").display()));
}

#[test]
fn test_excluded_dir_is_never_entered() {
    let state = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    let root = tree.path().join("r");
    build_small_tree(&root);
    let config = config(state.path(), vec![root.clone()]);
    fs::write(
        &config.exclusion_lists[0],
        format!("{}\n", root.join("sub").display()),
    )
    .unwrap();

    let (sink, summary) = run_memory(&config);

    assert_eq!(emitted(&sink), BTreeSet::from([root.join("a.txt")]));
    assert_eq!(summary.files, 1);
    assert_eq!(
        checkpoint::load(&config.checkpoint_path).unwrap(),
        vec![root.join("sub")]
    );
}

#[test]
fn test_pattern_exclusion_on_full_path() {
    let state = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    let root = tree.path().join("r");
    build_small_tree(&root);
    let patterns = state.path().join("regex.txt");
    fs::write(&patterns, "\n.*/sub$\n").unwrap();
    let mut config = config(state.path(), vec![root.clone()]);
    config.pattern_file = Some(patterns);

    let (sink, _) = run_memory(&config);
    assert_eq!(emitted(&sink), BTreeSet::from([root.join("a.txt")]));
}

#[test]
fn test_small_batches_emit_each_file_once() {
    let state = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    let all = build_three_dirs(tree.path());
    let mut config = config(state.path(), vec![tree.path().to_path_buf()]);
    config.chunk_size = 1;

    let (sink, summary) = run_memory(&config);

    assert_eq!(emitted(&sink), all);
    assert_eq!(sink.offered, all.len() as u64);
    // A batch is written once it exceeds one record, plus the final flush.
    assert_eq!(summary.batches, 3);
    assert_eq!(sink.batches, 3);
}

#[test]
fn test_multiple_roots_are_drained_in_order() {
    let state = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    let first = tree.path().join("first");
    let second = tree.path().join("second");
    build_small_tree(&first);
    build_small_tree(&second);
    let config = config(state.path(), vec![first.clone(), second.clone()]);

    let (sink, summary) = run_memory(&config);
    assert_eq!(summary.files, 6);
    assert_eq!(sink.len(), 6);
    assert_eq!(
        checkpoint::load(&config.checkpoint_path).unwrap(),
        vec![first.join("sub"), second.join("sub")]
    );
}

// ── Resumption ───────────────────────────────────────────────────────────────

#[test]
fn test_interrupted_run_resumes_without_losing_files() {
    let state = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    let all = build_three_dirs(tree.path());
    let mut config = config(state.path(), vec![tree.path().to_path_buf()]);
    config.chunk_size = 1;
    config.max_files = Some(3);

    let (first_sink, first) = run_memory(&config);
    assert_eq!(first.files, 3);
    assert!(!first.completed);

    // The first directory finished before the third file was pulled.
    let done = checkpoint::load(&config.checkpoint_path).unwrap();
    assert_eq!(done.len(), 1);
    let done_dir = done[0].clone();

    config.max_files = None;
    let (second_sink, second) = run_memory(&config);
    assert!(second.completed);

    let first_set = emitted(&first_sink);
    let second_set = emitted(&second_sink);
    assert_eq!(second.files, 4);
    assert!(second_set.iter().all(|p| !p.starts_with(&done_dir)));
    assert_eq!(&first_set | &second_set, all);
}

#[test]
fn test_failed_dir_is_retried_on_next_run() {
    let state = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    let root = tree.path().to_path_buf();
    for dir in ["a", "b"] {
        fs::create_dir(root.join(dir)).unwrap();
        write_bytes(&root.join(dir).join("x"), 1);
        write_bytes(&root.join(dir).join("y"), 1);
    }

    // Pull one file, then remove the directory that has not been entered.
    let mut config = config(state.path(), vec![root.clone()]);
    config.max_files = Some(1);
    let forest = config.build_forest().unwrap();
    let mut crawler = Crawler::new(&config, forest, MemorySink::new(), owners());
    crawler.run().unwrap();
    let (forest, sink) = crawler.into_parts();

    let entered = PathBuf::from(&sink.records().next().unwrap().parent);
    let other = if entered == root.join("a") {
        root.join("b")
    } else {
        root.join("a")
    };
    fs::remove_dir_all(&other).unwrap();

    config.max_files = None;
    let mut crawler = Crawler::new(&config, forest, sink, owners());
    let summary = crawler.run().unwrap();
    assert_eq!(summary.errors, 1);
    assert!(summary.completed);

    // Only the directory that finished cleanly is recorded.
    assert_eq!(
        checkpoint::load(&config.checkpoint_path).unwrap(),
        vec![entered.clone()]
    );

    fs::create_dir(&other).unwrap();
    write_bytes(&other.join("late"), 1);
    let (retry_sink, retry) = run_memory(&config);
    assert_eq!(retry.errors, 0);
    assert_eq!(emitted(&retry_sink), BTreeSet::from([other.join("late")]));
}

#[test]
fn test_resumed_run_after_completion_emits_only_root_files() {
    let state = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    let root = tree.path().join("r");
    build_small_tree(&root);
    let config = config(state.path(), vec![root.clone()]);

    run_memory(&config);
    let (sink, _) = run_memory(&config);

    // The root itself is never marked done while it has children on record,
    // so its loose files come around again; the sink ignores them.
    assert_eq!(emitted(&sink), BTreeSet::from([root.join("a.txt")]));
}

// ── Cancellation and background execution ────────────────────────────────────

#[test]
fn test_cancel_before_start_saves_checkpoint_and_stops() {
    let state = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    build_small_tree(tree.path());
    let config = config(state.path(), vec![tree.path().to_path_buf()]);

    let forest = config.build_forest().unwrap();
    let mut crawler = Crawler::new(&config, forest, MemorySink::new(), owners());
    crawler.cancel_flag().store(true, Ordering::Relaxed);
    let summary = crawler.run().unwrap();

    assert_eq!(summary.files, 0);
    assert!(!summary.completed);
    assert!(config.checkpoint_path.exists());
    assert!(crawler.sink().is_empty());
}

#[test]
fn test_background_crawl_reports_completion() {
    let state = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    let all = build_three_dirs(tree.path());
    let config = config(state.path(), vec![tree.path().to_path_buf()]);

    let forest = config.build_forest().unwrap();
    let crawler = Crawler::new(&config, forest, MemorySink::new(), owners());
    let handle = start_crawl(crawler).unwrap();
    assert!(!handle.is_cancelled());

    let mut saw_checkpoint = false;
    let mut completed_with = None;
    while let Ok(msg) = handle.progress_rx.recv_timeout(Duration::from_secs(30)) {
        match msg {
            CrawlProgress::Checkpoint { .. } => saw_checkpoint = true,
            CrawlProgress::Complete { files_found, .. } => completed_with = Some(files_found),
            CrawlProgress::Cancelled { .. } => panic!("crawl was unexpectedly cancelled"),
            _ => {}
        }
    }

    assert!(saw_checkpoint);
    assert_eq!(completed_with, Some(all.len() as u64));
    let summary = handle.join().unwrap();
    assert!(summary.completed);
    assert_eq!(summary.files, all.len() as u64);
}

// ── SQLite ───────────────────────────────────────────────────────────────────

#[test]
fn test_sqlite_sink_survives_rerun() {
    let state = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    let root = tree.path().join("r");
    build_small_tree(&root);
    let config = config(state.path(), vec![root.clone()]);
    let db = state.path().join("files.db");

    for _ in 0..2 {
        let forest = config.build_forest().unwrap();
        let sink = SqliteSink::open(&db).unwrap();
        let mut crawler = Crawler::new(&config, forest, sink, owners());
        crawler.run().unwrap();
        assert_eq!(crawler.sink().count().unwrap(), 3);
    }

    let sink = SqliteSink::open(&db).unwrap();
    let owner: String = sink
        .connection()
        .query_row(
            "SELECT owner FROM files WHERE name = 'b.txt'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(owner, "tester");
}
