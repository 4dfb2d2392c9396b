//! Storage traits and error types
//!
//! This module defines the trait interface for state backends and
//! associated error types.

use crate::storage::SeenSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for backends that persist the [`SeenSet`]
///
/// A store never mutates the set on its own; it only serializes what the
/// harvester hands it and deserializes it back.
pub trait StateStore {
    /// Loads the previously saved set
    ///
    /// Returns an empty set when nothing was saved yet.
    fn load(&self) -> StorageResult<SeenSet>;

    /// Replaces the saved set with `seen`
    ///
    /// A failed save must leave the previously saved set readable.
    fn save(&self, seen: &SeenSet) -> StorageResult<()>;
}

impl<S: StateStore + ?Sized> StateStore for &S {
    fn load(&self) -> StorageResult<SeenSet> {
        (**self).load()
    }

    fn save(&self, seen: &SeenSet) -> StorageResult<()> {
        (**self).save(seen)
    }
}
