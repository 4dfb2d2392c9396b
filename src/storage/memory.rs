//! In-memory state backend

use crate::storage::{SeenSet, StateStore, StorageResult};
use std::sync::Mutex;

/// Keeps the saved [`SeenSet`] in memory
///
/// Useful when embedding the harvester or in tests; it also counts saves.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    saved: Mutex<SeenSet>,
    saves: Mutex<usize>,
}

impl MemoryStateStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `seen`
    pub fn with_seen(seen: SeenSet) -> Self {
        Self {
            saved: Mutex::new(seen),
            saves: Mutex::new(0),
        }
    }

    /// Number of completed saves
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The currently saved set
    pub fn snapshot(&self) -> SeenSet {
        self.saved.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> StorageResult<SeenSet> {
        Ok(self.snapshot())
    }

    fn save(&self, seen: &SeenSet) -> StorageResult<()> {
        *self.saved.lock().unwrap_or_else(|e| e.into_inner()) = seen.clone();
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}
