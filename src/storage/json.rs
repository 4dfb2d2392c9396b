//! JSON file state backend

use crate::storage::{SeenSet, StateRecord, StateStore, StorageResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Keeps the [`SeenSet`] in a JSON file shaped `{"recipe_links": [...]}`
///
/// Saves go to a sibling `.tmp` file that is then renamed over the target,
/// so an interrupted save leaves the previous state intact.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    /// Creates a store backed by the file at `path`
    ///
    /// The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> StorageResult<SeenSet> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No state file at {}, starting empty", self.path.display());
                return Ok(SeenSet::new());
            }
            Err(e) => return Err(e.into()),
        };

        let record: StateRecord = serde_json::from_str(&text)?;
        let seen = SeenSet::from(record);
        tracing::info!(
            "Loaded {} processed recipes from {}",
            seen.len(),
            self.path.display()
        );
        Ok(seen)
    }

    fn save(&self, seen: &SeenSet) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string(&StateRecord::from(seen))?;
        let temp = self.temp_path();
        std::fs::write(&temp, json)?;
        std::fs::rename(&temp, &self.path)?;

        tracing::debug!(
            "Saved {} processed recipes to {}",
            seen.len(),
            self.path.display()
        );
        Ok(())
    }
}
