//! URL list files
//!
//! A URL list is a plain text file with one recipe URL per line.

use std::io::ErrorKind;
use std::path::Path;

/// Reads the URLs listed in `path`
///
/// Blank lines and surrounding whitespace are ignored. A missing file is
/// logged and treated as an empty list; other read errors are returned.
pub fn read_url_list(path: &Path) -> std::io::Result<Vec<String>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!("No file found for path: {}", path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
