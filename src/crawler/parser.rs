//! HTML link extraction
//!
//! Pulls the `href` of every `<a>` element out of a page and makes it
//! absolute, so the classifier only ever sees full URLs.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("hardcoded selector is valid"));

/// Extracts all anchor links from an HTML page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document, including `download` links
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
/// - Anything that is not HTTP(S) after resolution
///
/// # Arguments
///
/// * `html` - The HTML content
/// * `base_url` - The page URL, used to resolve relative links
///
/// # Returns
///
/// Absolute URLs in document order, duplicates included
///
/// # Example
///
/// ```
/// use hf_harvest::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/recipes/chicken-recipes">Chicken</a>"#;
/// let base = Url::parse("https://www.hellofresh.com/recipes").unwrap();
/// assert_eq!(
///     extract_links(html, &base),
///     vec!["https://www.hellofresh.com/recipes/chicken-recipes".to_string()]
/// );
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);

    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Like [`extract_links`], taking the page URL as a string
///
/// Returns no links if the page URL itself cannot be parsed.
pub fn extract_links_from(html: &str, page_url: &str) -> Vec<String> {
    match Url::parse(page_url) {
        Ok(base) => extract_links(html, &base),
        Err(e) => {
            tracing::debug!("Cannot resolve links against {}: {}", page_url, e);
            Vec::new()
        }
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url.to_string())
    } else {
        None
    }
}
