//! JSON corpus file IO.
//!
//! Reads are lenient (a malformed file is the caller's decision to skip);
//! writes are pretty-printed UTF-8 with non-ASCII characters unescaped and
//! keys in insertion order, and only happen when a pass actually changed
//! something.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use linkcurator_shared::{LinkCuratorError, Result};

/// List the `.json` files in `dir`, sorted by file name.
///
/// A missing directory is the one fatal error of a run: there is nothing
/// to iterate and silently doing nothing would look like success.
pub fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(LinkCuratorError::validation(format!(
            "directory {} does not exist",
            dir.display()
        )));
    }

    let entries = std::fs::read_dir(dir).map_err(|e| LinkCuratorError::io(dir, e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    debug!(dir = %dir.display(), count = files.len(), "listed corpus files");
    Ok(files)
}

/// Read and deserialize one corpus file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| LinkCuratorError::io(path, e))?;

    serde_json::from_str(&content)
        .map_err(|e| LinkCuratorError::parse(format!("{}: {e}", path.display())))
}

/// Serialize and write one corpus file, pretty-printed with 2-space indent.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| LinkCuratorError::parse(format!("{}: {e}", path.display())))?;

    std::fs::write(path, content).map_err(|e| LinkCuratorError::io(path, e))?;
    debug!(path = %path.display(), "wrote corpus file");
    Ok(())
}

/// The bare file name of a path, for rule-table lookups.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
