//! dirfringe — resumable file inventory crawler.
//!
//! Thin binary entry point. All crawl logic lives in the `dirfringe-core`
//! crate.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::CliArgs;
use dirfringe_core::crawler::{start_crawl, CrawlProgress, Crawler};
use dirfringe_core::platform::SystemOwnerResolver;
use dirfringe_core::sink::{MemorySink, RecordSink, SqliteSink};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<()> {
    info!("dirfringe starting");

    let mut config = args.to_config();
    let forest = config
        .build_forest()
        .context("Failed to prepare traversal state")?;

    let sink: Box<dyn RecordSink + Send> = if args.dry_run {
        // Nothing is stored, so the real checkpoint must not advance.
        let mut name = config.checkpoint_path.as_os_str().to_os_string();
        name.push(".dry-run");
        config.checkpoint_path = name.into();
        info!(
            checkpoint = %config.checkpoint_path.display(),
            "Dry run: records are kept in memory only"
        );
        Box::new(MemorySink::new())
    } else {
        let mut sink = SqliteSink::open(&args.output)
            .with_context(|| format!("Failed to open database {}", args.output.display()))?;
        if let Some(init_sql) = &args.init_sql {
            sink = sink
                .with_schema_file(init_sql)
                .with_context(|| format!("Failed to read schema {}", init_sql.display()))?;
        }
        Box::new(sink)
    };

    let cancel_flag = Arc::new(AtomicBool::new(false));
    let handler_flag = cancel_flag.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, saving checkpoint...");
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let crawler = Crawler::new(&config, forest, sink, SystemOwnerResolver::new())
        .with_cancel_flag(cancel_flag);
    let handle = start_crawl(crawler).context("Failed to start crawler thread")?;

    // Errors and checkpoints are already logged by the crawler itself.
    for msg in handle.progress_rx.iter() {
        if let CrawlProgress::Update {
            files_found,
            error_count,
            live_nodes,
            current_path,
        } = msg
        {
            info!(files_found, error_count, live_nodes, "At {current_path}");
        }
    }

    let summary = handle.join().context("Crawl failed")?;
    if summary.completed {
        info!(
            files = summary.files,
            bytes = summary.bytes,
            errors = summary.errors,
            duration = ?summary.duration,
            "Done"
        );
    } else {
        warn!(
            files = summary.files,
            checkpoint = %config.checkpoint_path.display(),
            "Stopped early; rerun with the same checkpoint to continue"
        );
    }
    Ok(())
}
