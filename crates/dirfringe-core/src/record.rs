/// The row written to the sink for each leaf entry.
use crate::model::RawEntry;
use crate::platform::OwnerResolver;
use chrono::{DateTime, Local, NaiveDate};
use compact_str::CompactString;
use std::time::SystemTime;

/// Metadata of one file. Identity is `(parent, name)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Containing directory, absolute.
    pub parent: String,
    /// File name including its extension.
    pub name: CompactString,
    /// Extension without the dot; empty when there is none.
    pub suffix: CompactString,
    pub owner: CompactString,
    pub size: u64,
    pub modified: Option<NaiveDate>,
    /// Not every platform/filesystem reports a birth time.
    pub created: Option<NaiveDate>,
    pub accessed: Option<NaiveDate>,
}

impl FileRecord {
    /// Build a record from a discovered entry. Never fails.
    pub fn from_entry(entry: &RawEntry, owners: &dyn OwnerResolver) -> Self {
        let meta = &entry.metadata;
        let suffix = entry
            .path
            .extension()
            .map(|ext| CompactString::new(ext.to_string_lossy()))
            .unwrap_or_default();

        Self {
            parent: entry.parent().to_string_lossy().into_owned(),
            name: CompactString::new(entry.file_name()),
            suffix,
            owner: CompactString::new(owners.resolve_owner(entry)),
            size: meta.len(),
            modified: meta.modified().ok().map(local_date),
            created: meta.created().ok().map(local_date),
            accessed: meta.accessed().ok().map(local_date),
        }
    }
}

/// Calendar date of `time` in the local timezone.
pub fn local_date(time: SystemTime) -> NaiveDate {
    DateTime::<Local>::from(time).date_naive()
}
