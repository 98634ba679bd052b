/// A leaf entry discovered by the traversal, with its metadata already read.
use std::borrow::Cow;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// A non-directory filesystem object.
///
/// Metadata comes from the directory entry and does not follow symlinks.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub path: PathBuf,
    pub metadata: Metadata,
}

impl RawEntry {
    /// Final path segment, lossily converted.
    pub fn file_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default()
    }

    /// Containing directory.
    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}
