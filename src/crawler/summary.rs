//! Run statistics

use std::fmt;

/// Counters collected while harvesting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Listing, category and sitemap pages fetched for their links
    pub pages_expanded: usize,

    /// Pages (listing or recipe) that answered with an error or not at all
    pub unreachable_pages: usize,

    /// Recipe pages fetched successfully
    pub recipes_fetched: usize,

    /// Recipe pages skipped because an earlier run finished them
    pub recipes_skipped: usize,

    /// Files written to disk
    pub files_downloaded: usize,

    /// Files that failed to download
    pub download_failures: usize,

    /// Recipes newly added to the processed set
    pub recipes_recorded: usize,

    /// Size of the processed set when the run finished
    pub recipes_known: usize,
}

impl CrawlSummary {
    /// Logs the summary at info level
    pub fn log(&self) {
        tracing::info!(
            "Expanded {} pages ({} unreachable), fetched {} recipes ({} skipped as already done)",
            self.pages_expanded,
            self.unreachable_pages,
            self.recipes_fetched,
            self.recipes_skipped
        );
        tracing::info!(
            "Downloaded {} files, {} failed; {} recipes recorded this run, {} known in total",
            self.files_downloaded,
            self.download_failures,
            self.recipes_recorded,
            self.recipes_known
        );
    }
}

impl fmt::Display for CrawlSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files downloaded, {} failed, {} recipes recorded",
            self.files_downloaded, self.download_failures, self.recipes_recorded
        )
    }
}
