//! Storage module for persisting harvest progress
//!
//! This module handles the set of recipe URLs whose pages were fetched and
//! whose files were all downloaded, including:
//! - The in-memory [`SeenSet`] owned by the harvester
//! - The [`StateStore`] trait that loads and saves it
//! - A JSON file backend and an in-memory backend

mod json;
mod memory;
mod traits;

pub use json::JsonStateStore;
pub use memory::MemoryStateStore;
pub use traits::{StateStore, StorageError, StorageResult};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Recipe URLs already fully processed
///
/// A URL in this set is never fetched again by a listing crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenSet {
    urls: HashSet<String>,
}

impl SeenSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the URL was already processed
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Records a processed URL, returning true if it was new
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        self.urls.insert(url.into())
    }

    /// Number of recorded URLs
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Returns true if nothing was recorded yet
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Iterates over recorded URLs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    /// Recorded URLs, sorted
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.iter().map(str::to_string).collect();
        urls.sort();
        urls
    }
}

impl Extend<String> for SeenSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.urls.extend(iter);
    }
}

impl FromIterator<String> for SeenSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            urls: iter.into_iter().collect(),
        }
    }
}

/// On-disk shape of the state file
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StateRecord {
    /// Processed recipe URLs; order carries no meaning
    #[serde(default)]
    pub recipe_links: Vec<String>,
}

impl From<&SeenSet> for StateRecord {
    fn from(seen: &SeenSet) -> Self {
        Self {
            recipe_links: seen.to_sorted_vec(),
        }
    }
}

impl From<StateRecord> for SeenSet {
    fn from(record: StateRecord) -> Self {
        record.recipe_links.into_iter().collect()
    }
}
