/// dirfringe core — resumable traversal, checkpoints, and record sinks.
///
/// This crate contains all crawl logic with no CLI dependencies.
///
/// # Modules
///
/// - [`model`] — Arena of lazily listed directory nodes and the root forest.
/// - [`filter`] — Prefix-anchored regular-expression exclusion.
/// - [`checkpoint`] — Checkpoint / exclusion-list file codec.
/// - [`crawler`] — Batching driver, progress reporting and cancellation.
/// - [`record`] — Per-file metadata records.
/// - [`sink`] — SQLite and in-memory record storage.
/// - [`platform`] — File owner lookup for Unix and Windows.
/// - [`config`] — Run configuration and forest construction.
pub mod checkpoint;
pub mod config;
pub mod crawler;
pub mod error;
pub mod filter;
pub mod model;
pub mod platform;
pub mod record;
pub mod sink;
