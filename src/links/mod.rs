//! Link handling module for hf-harvest
//!
//! This module provides the pattern rules that tell recipe pages, category
//! pages, sitemap letter pages and downloadable files apart, and the policy
//! that turns a URL into a local file name.

mod classifier;
mod naming;

pub use classifier::LinkClassifier;
pub use naming::NamePolicy;

/// Classification of a hyperlink
///
/// A link is never stored with its kind; the kind is recomputed from the URL
/// string whenever it is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// A single recipe page (slug carries a digit)
    RecipeDetail,
    /// A recipe category or listing page (slug of letters and hyphens)
    CategoryPage,
    /// One of the per-letter sitemap index pages
    SitemapLetterPage,
    /// A terminal file to download
    DownloadableFile,
    /// Anything else
    Unclassified,
}
