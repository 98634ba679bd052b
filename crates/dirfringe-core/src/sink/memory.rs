/// In-memory sink, used for dry runs and tests.
use super::RecordSink;
use crate::error::SinkError;
use crate::record::FileRecord;
use compact_str::CompactString;
use std::collections::BTreeMap;

/// Keeps the first record seen for each `(parent, name)`.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: BTreeMap<(String, CompactString), FileRecord>,
    /// Number of records offered, including ignored duplicates.
    pub offered: u64,
    /// Number of batches written.
    pub batches: u64,
    pub initialised: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct records stored.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stored records ordered by `(parent, name)`.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }
}

impl RecordSink for MemorySink {
    fn init(&mut self) -> Result<(), SinkError> {
        self.initialised = true;
        Ok(())
    }

    fn write_batch(&mut self, records: &[FileRecord]) -> Result<(), SinkError> {
        for record in records {
            self.offered += 1;
            self.records
                .entry((record.parent.clone(), record.name.clone()))
                .or_insert_with(|| record.clone());
        }
        self.batches += 1;
        Ok(())
    }
}
