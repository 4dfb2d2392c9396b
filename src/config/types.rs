use serde::Deserialize;

/// Main configuration structure for hf-harvest
///
/// Every table is optional in the TOML file; missing values fall back to the
/// defaults below, which target the public HelloFresh site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Where the recipe site lives and how its sections are laid out
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Scheme and host of the site, without a trailing slash
    #[serde(rename = "root-url")]
    pub root_url: String,

    /// Path of the recipe section; recipe and category pages live below it
    #[serde(rename = "recipes-path")]
    pub recipes_path: String,

    /// Path of the sitemap index that links to the per-letter pages
    #[serde(rename = "sitemap-path")]
    pub sitemap_path: String,
}

impl SiteConfig {
    /// The recipe index page crawled by `--any`
    pub fn recipe_index_url(&self) -> String {
        format!("{}{}", self.root_url, self.recipes_path)
    }

    /// The sitemap root crawled by `--all`
    pub fn sitemap_url(&self) -> String {
        format!("{}{}", self.root_url, self.sitemap_path)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root_url: "https://www.hellofresh.com".to_string(),
            recipes_path: "/recipes".to_string(),
            sitemap_path: "/pages/sitemap".to_string(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of requests dispatched together in one window
    pub concurrency: usize,

    /// Maximum category depth followed when recursing (unbounded if absent)
    #[serde(rename = "max-depth")]
    pub max_depth: Option<u32>,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            max_depth: None,
            request_timeout_secs: 60,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "hf-harvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory for downloaded files
    #[serde(rename = "download-dir")]
    pub download_dir: String,

    /// Path to the JSON file holding finished recipe URLs
    #[serde(rename = "state-path")]
    pub state_path: String,

    /// Extension of the files to download, including the dot
    #[serde(rename = "file-extension")]
    pub file_extension: String,

    /// Put each sitemap letter's downloads in its own subdirectory
    #[serde(rename = "organize-by-letter")]
    pub organize_by_letter: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            download_dir: "./pdfs".to_string(),
            state_path: "state.json".to_string(),
            file_extension: ".pdf".to_string(),
            organize_by_letter: true,
        }
    }
}
