/// Record sinks — where emitted file records are persisted.
///
/// A sink must tolerate seeing the same record again: a resumed run re-emits
/// whatever was processed after the last saved checkpoint. Records are keyed
/// on `(parent, name)` and duplicates are ignored, never updated.
pub mod memory;
pub mod sqlite;

pub use memory::MemorySink;
pub use sqlite::SqliteSink;

use crate::error::SinkError;
use crate::record::FileRecord;

/// Batched, insert-if-absent record storage.
pub trait RecordSink {
    /// Prepare the storage (schema). Called once before the first batch.
    fn init(&mut self) -> Result<(), SinkError>;

    /// Persist `records`, ignoring any whose key already exists.
    ///
    /// When this returns `Ok`, the batch is durable.
    fn write_batch(&mut self, records: &[FileRecord]) -> Result<(), SinkError>;
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn init(&mut self) -> Result<(), SinkError> {
        (**self).init()
    }

    fn write_batch(&mut self, records: &[FileRecord]) -> Result<(), SinkError> {
        (**self).write_batch(records)
    }
}
