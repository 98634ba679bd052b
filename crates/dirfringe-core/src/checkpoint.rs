/// Checkpoint file codec.
///
/// A checkpoint is plain text, one absolute path per line, no escaping. Each
/// line names a directory that is either fully processed or forbidden, so a
/// checkpoint is simply a growable exclusion list and static exclusion lists
/// share the same format and loader.
use crate::error::CheckpointError;
use crate::model::Forest;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write the forest's current state to `location`, replacing what was there.
///
/// The lines go to a sibling temporary file first, which is synced and then
/// renamed over `location`; a crash mid-write leaves the old checkpoint intact.
/// Returns the number of lines written.
pub fn save(forest: &Forest, location: &Path) -> Result<usize, CheckpointError> {
    let lines = forest.serialize();
    write_lines(location, &lines).map_err(|source| CheckpointError {
        path: location.to_path_buf(),
        source,
    })?;
    debug!(file = %location.display(), lines = lines.len(), "Checkpoint saved");
    Ok(lines.len())
}

fn write_lines(location: &Path, lines: &[PathBuf]) -> io::Result<()> {
    let tmp = temp_path(location);
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        for line in lines {
            writer.write_all(line.to_string_lossy().as_bytes())?;
            writer.write_all(b"\n")?;
        }
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, location)
}

fn temp_path(location: &Path) -> PathBuf {
    let mut name = location
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    location.with_file_name(name)
}

/// Read the paths listed in `location`.
///
/// Blank lines are skipped and a trailing `\r` is dropped.
pub fn load(location: &Path) -> Result<Vec<PathBuf>, CheckpointError> {
    let err = |source| CheckpointError {
        path: location.to_path_buf(),
        source,
    };
    let reader = BufReader::new(File::open(location).map_err(err)?);

    let mut paths = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(err)?;
        let line = line.trim_end_matches('\r');
        if !line.is_empty() {
            paths.push(PathBuf::from(line));
        }
    }
    Ok(paths)
}

/// Like [`load`], but a missing file yields an empty list.
pub fn load_if_present(location: &Path) -> Result<Vec<PathBuf>, CheckpointError> {
    match load(location) {
        Err(e) if e.source.kind() == io::ErrorKind::NotFound => {
            debug!(file = %location.display(), "No file, nothing to load");
            Ok(Vec::new())
        }
        other => other,
    }
}
