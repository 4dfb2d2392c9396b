use crate::config::SiteConfig;
use crate::links::LinkKind;
use crate::ConfigError;
use regex::Regex;

/// Pattern rules for the links found on recipe site pages
///
/// The rules are anchored on the configured site root, so the same classifier
/// works against the live site and against a local mock server.
///
/// # Rules
///
/// | Kind | Shape after `<root><recipes>/` |
/// |------|--------------------------------|
/// | RecipeDetail | letters or hyphens, then anything containing a digit |
/// | CategoryPage | letters and hyphens only, up to the end |
///
/// Sitemap letter pages are `<root><sitemap>/recipes-<letter>`. Downloadable
/// files are recognised by their extension alone, wherever they are hosted.
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    recipe: Regex,
    category: Regex,
    sitemap_letter: Regex,
    extension: String,
}

impl LinkClassifier {
    /// Builds the classifier for a site layout and download extension
    ///
    /// # Arguments
    ///
    /// * `site` - Root URL and section paths of the site
    /// * `extension` - Extension of downloadable files, including the dot
    ///
    /// # Returns
    ///
    /// * `Ok(LinkClassifier)` - All patterns compiled
    /// * `Err(ConfigError)` - A pattern built from the configuration was invalid
    pub fn new(site: &SiteConfig, extension: &str) -> Result<Self, ConfigError> {
        let root = regex::escape(&site.root_url);
        let recipes = regex::escape(&site.recipes_path);
        let sitemap = regex::escape(&site.sitemap_path);

        Ok(Self {
            recipe: compile(&format!(r"(?i)^{}{}/[a-z-]+?\S+\d\S*", root, recipes))?,
            category: compile(&format!(r"(?i)^{}{}/[a-z-]+$", root, recipes))?,
            sitemap_letter: compile(&format!(r"(?i)^{}{}/recipes-[a-z]$", root, sitemap))?,
            extension: extension.to_ascii_lowercase(),
        })
    }

    /// Returns true if the link points at a single recipe page
    pub fn is_recipe(&self, link: &str) -> bool {
        !link.is_empty() && self.recipe.is_match(link)
    }

    /// Returns true if the link points at a recipe category or listing page
    pub fn is_category(&self, link: &str) -> bool {
        !link.is_empty() && self.category.is_match(link)
    }

    /// Returns true if the link points at a per-letter sitemap page
    pub fn is_sitemap_letter(&self, link: &str) -> bool {
        !link.is_empty() && self.sitemap_letter.is_match(link)
    }

    /// Returns true if the link is a file to download
    ///
    /// Links of five characters or fewer are rejected outright.
    pub fn is_download(&self, link: &str) -> bool {
        link.len() > 5 && link.to_ascii_lowercase().ends_with(&self.extension)
    }

    /// Classifies a link
    ///
    /// Downloadable files win over page kinds so a PDF stored under the
    /// recipe path is never fetched as a page.
    pub fn classify(&self, link: &str) -> LinkKind {
        if self.is_download(link) {
            LinkKind::DownloadableFile
        } else if self.is_recipe(link) {
            LinkKind::RecipeDetail
        } else if self.is_category(link) {
            LinkKind::CategoryPage
        } else if self.is_sitemap_letter(link) {
            LinkKind::SitemapLetterPage
        } else {
            LinkKind::Unclassified
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern(format!("{}: {}", pattern, e)))
}
