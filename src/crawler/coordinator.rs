//! Harvest coordinator - main crawl orchestration logic
//!
//! This module drives one harvest run:
//! - Expanding a listing page into recipe and category links
//! - Skipping recipes finished by earlier runs
//! - Fetching recipe pages and collecting their download links
//! - Downloading the files and recording finished recipes
//! - Walking category pages and the sitemap letter pages
//!
//! Control flow is single-threaded; only the fetch and download windows run
//! concurrently, so the processed and visited sets need no locking.

use crate::config::Config;
use crate::crawler::downloader::download_files;
use crate::crawler::fetcher::{build_http_client, fetch_page, fetch_pages, FetchOutcome};
use crate::crawler::parser::extract_links_from;
use crate::crawler::CrawlSummary;
use crate::links::{LinkClassifier, LinkKind, NamePolicy};
use crate::storage::{SeenSet, StateStore};
use crate::HarvestError;
use reqwest::Client;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// Links found on a listing page, by kind
#[derive(Debug, Default)]
struct PageLinks {
    recipes: BTreeSet<String>,
    categories: BTreeSet<String>,
    letters: BTreeSet<String>,
}

/// What a run should do, in the order the steps are executed
#[derive(Debug, Clone, Default)]
pub struct HarvestPlan {
    /// Crawl the recipe index page
    pub index: bool,

    /// Follow category pages from listing crawls
    pub recurse: bool,

    /// Explicit recipe URLs, processed even if already recorded
    pub recipe_urls: Vec<String>,

    /// A listing page to crawl
    pub list_url: Option<String>,

    /// Walk every sitemap letter page
    pub all: bool,
}

impl HarvestPlan {
    /// Returns true if the plan has nothing to do
    pub fn is_empty(&self) -> bool {
        !self.index && self.recipe_urls.is_empty() && self.list_url.is_none() && !self.all
    }
}

/// Main harvest coordinator
///
/// Owns the processed-recipe set (loaded from the store on creation) and the
/// set of listing pages expanded during this run.
pub struct Harvester<S: StateStore> {
    config: Config,
    client: Client,
    classifier: LinkClassifier,
    namer: NamePolicy,
    store: S,
    seen: SeenSet,
    visited: HashSet<String>,
    download_dir: PathBuf,
    summary: CrawlSummary,
}

impl<S: StateStore> Harvester<S> {
    /// Creates a new harvester
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    /// * `store` - Backend holding recipes finished by earlier runs
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Configuration valid, state loaded, download directory created
    /// * `Err(HarvestError)` - Any of those steps failed
    pub fn new(config: Config, store: S) -> Result<Self, HarvestError> {
        crate::config::validate(&config)?;

        let classifier = LinkClassifier::new(&config.site, &config.output.file_extension)?;
        let namer = NamePolicy::new(&config.output.file_extension);
        let client = build_http_client(&config.user_agent, &config.crawler)?;

        let seen = store.load()?;
        let download_dir = PathBuf::from(&config.output.download_dir);
        std::fs::create_dir_all(&download_dir)?;

        Ok(Self {
            config,
            client,
            classifier,
            namer,
            store,
            seen,
            visited: HashSet::new(),
            download_dir,
            summary: CrawlSummary::default(),
        })
    }

    /// Recipes finished so far
    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Counters for the run so far
    pub fn summary(&self) -> &CrawlSummary {
        &self.summary
    }

    /// Directory downloads currently go to
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Runs every step of `plan`, then persists and returns the summary
    pub async fn run(mut self, plan: HarvestPlan) -> Result<CrawlSummary, HarvestError> {
        if plan.index {
            self.harvest_index(plan.recurse).await?;
        }
        if !plan.recipe_urls.is_empty() {
            self.harvest_recipe_urls(plan.recipe_urls).await?;
        }
        if let Some(list_url) = plan.list_url.as_deref() {
            self.harvest_listing(list_url, plan.recurse).await?;
        }
        if plan.all {
            self.harvest_all(plan.recurse).await?;
        }
        self.finish()
    }

    /// Crawls the configured recipe index page
    pub async fn harvest_index(&mut self, recurse: bool) -> Result<(), HarvestError> {
        let index = self.config.site.recipe_index_url();
        self.harvest_listing(&index, recurse).await
    }

    /// Crawls a listing page, optionally following its category pages
    ///
    /// Recipes already in the processed set are skipped. Categories are walked
    /// depth-first from an explicit stack; each one is expanded at most once
    /// per run.
    pub async fn harvest_listing(&mut self, url: &str, recurse: bool) -> Result<(), HarvestError> {
        tracing::info!("Getting recipes from page {}", url);
        self.visited.insert(url.to_string());
        self.crawl_from(url, recurse).await?;
        self.persist()
    }

    /// Downloads the files linked from explicit recipe URLs
    ///
    /// The processed set is not consulted: asking for a recipe by URL always
    /// fetches it again.
    pub async fn harvest_recipe_urls(&mut self, urls: Vec<String>) -> Result<(), HarvestError> {
        let mut unique = HashSet::new();
        let urls: Vec<String> = urls
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty() && unique.insert(url.clone()))
            .collect();

        for url in urls.iter().filter(|url| !self.classifier.is_recipe(url)) {
            tracing::warn!("{} is not a recipe page and will not be recorded", url);
        }

        tracing::info!("Getting {} recipes by url", urls.len());
        self.process_recipes(urls).await?;
        self.persist()
    }

    /// Walks every sitemap letter page
    ///
    /// With `organize-by-letter` enabled, each letter's files go to a
    /// subdirectory named after the letter. The download directory is restored
    /// afterwards, also when a letter fails.
    pub async fn harvest_all(&mut self, recurse: bool) -> Result<(), HarvestError> {
        tracing::info!("Getting all recipes");

        let sitemap = self.config.site.sitemap_url();
        let letters = self.expand_page(&sitemap).await.letters;
        if letters.is_empty() {
            tracing::warn!("No sitemap letter pages found on {}", sitemap);
        }

        let top = self.download_dir.clone();
        let result = self.crawl_letters(letters, &top, recurse).await;
        self.download_dir = top;
        result?;

        self.persist()
    }

    /// Saves the processed set
    pub fn persist(&self) -> Result<(), HarvestError> {
        self.store.save(&self.seen)?;
        Ok(())
    }

    /// Persists the processed set and returns the run summary
    pub fn finish(self) -> Result<CrawlSummary, HarvestError> {
        self.persist()?;
        let mut summary = self.summary;
        summary.recipes_known = self.seen.len();
        Ok(summary)
    }

    async fn crawl_letters(
        &mut self,
        letters: BTreeSet<String>,
        top: &Path,
        recurse: bool,
    ) -> Result<(), HarvestError> {
        for letter_page in letters {
            if !self.visited.insert(letter_page.clone()) {
                continue;
            }

            if self.config.output.organize_by_letter {
                let letter = letter_page
                    .chars()
                    .last()
                    .map(|c| c.to_ascii_lowercase().to_string())
                    .unwrap_or_default();
                let dir = top.join(letter);
                std::fs::create_dir_all(&dir)?;
                self.download_dir = dir;
            }

            tracing::info!("Getting recipes from page {}", letter_page);
            self.crawl_from(&letter_page, recurse).await?;
        }
        Ok(())
    }

    /// Expands `start` and, when recursing, every category reachable from it
    ///
    /// The caller marks `start` as visited.
    async fn crawl_from(&mut self, start: &str, recurse: bool) -> Result<(), HarvestError> {
        let mut stack: Vec<(String, u32)> = vec![(start.to_string(), 0)];

        while let Some((page, depth)) = stack.pop() {
            let links = self.expand_page(&page).await;

            let total = links.recipes.len();
            let fresh: Vec<String> = links
                .recipes
                .into_iter()
                .filter(|url| !self.seen.contains(url))
                .collect();
            let skipped = total - fresh.len();
            if skipped > 0 {
                tracing::debug!("Skipping {} recipes already processed", skipped);
                self.summary.recipes_skipped += skipped;
            }

            self.process_recipes(fresh).await?;

            if !recurse {
                continue;
            }
            if let Some(max_depth) = self.config.crawler.max_depth {
                if depth >= max_depth {
                    tracing::debug!("Not following categories of {} (depth {})", page, depth);
                    continue;
                }
            }

            // Reversed so the alphabetically first category is expanded next
            for category in links.categories.into_iter().rev() {
                if self.visited.insert(category.clone()) {
                    stack.push((category, depth + 1));
                }
            }
        }

        Ok(())
    }

    /// Fetches one page and sorts its links by kind
    async fn expand_page(&mut self, url: &str) -> PageLinks {
        self.summary.pages_expanded += 1;

        let links = match fetch_page(&self.client, url).await {
            FetchOutcome::Page {
                final_url, body, ..
            } => extract_links_from(&body, &final_url),
            _ => {
                self.summary.unreachable_pages += 1;
                Vec::new()
            }
        };

        let mut page = PageLinks::default();
        for link in links {
            match self.classifier.classify(&link) {
                LinkKind::RecipeDetail => {
                    page.recipes.insert(link);
                }
                LinkKind::CategoryPage => {
                    page.categories.insert(link);
                }
                LinkKind::SitemapLetterPage => {
                    page.letters.insert(link);
                }
                LinkKind::DownloadableFile | LinkKind::Unclassified => {}
            }
        }

        tracing::debug!(
            "{}: {} recipes, {} categories, {} letter pages",
            url,
            page.recipes.len(),
            page.categories.len(),
            page.letters.len()
        );
        page
    }

    /// Fetches recipe pages, downloads their files, records finished recipes
    ///
    /// A recipe is recorded only if its page was fetched and every file it
    /// links to was saved. Recipes without any file are recorded as well.
    /// URLs that do not look like recipe pages are processed but never
    /// recorded.
    async fn process_recipes(&mut self, recipes: Vec<String>) -> Result<(), HarvestError> {
        if recipes.is_empty() {
            return Ok(());
        }

        let concurrency = self.config.crawler.concurrency;
        tracing::info!("Fetching {} recipe pages", recipes.len());
        let pages = fetch_pages(&self.client, recipes, concurrency).await;

        let mut files_by_recipe: Vec<(String, BTreeSet<String>)> = Vec::new();
        let mut files = BTreeSet::new();
        for outcome in pages {
            match outcome {
                FetchOutcome::Page {
                    url,
                    final_url,
                    body,
                } => {
                    self.summary.recipes_fetched += 1;
                    let found: BTreeSet<String> = extract_links_from(&body, &final_url)
                        .into_iter()
                        .filter(|link| self.classifier.is_download(link))
                        .collect();
                    if found.is_empty() {
                        tracing::debug!("No download link on {}", url);
                    }
                    files.extend(found.iter().cloned());
                    files_by_recipe.push((url, found));
                }
                other => {
                    tracing::debug!("Not recording {}", other.url());
                    self.summary.unreachable_pages += 1;
                }
            }
        }

        if !files.is_empty() {
            tracing::info!("Downloading {} files", files.len());
        }
        let report = download_files(
            &self.client,
            &self.namer,
            files.into_iter().collect(),
            &self.download_dir,
            concurrency,
        )
        .await;

        self.summary.files_downloaded += report.saved.len();
        self.summary.download_failures += report.failed.len() + report.aborted;

        // Only recipe pages are recorded, whatever the caller passed in
        let finished: Vec<String> = files_by_recipe
            .into_iter()
            .filter(|(url, files)| {
                self.classifier.is_recipe(url) && files.iter().all(|file| report.was_saved(file))
            })
            .map(|(url, _)| url)
            .collect();

        let before = self.seen.len();
        self.seen.extend(finished);
        let recorded = self.seen.len() - before;
        self.summary.recipes_recorded += recorded;

        if recorded > 0 {
            self.persist()?;
        }
        Ok(())
    }
}

/// Runs a complete harvest
///
/// # Example
///
/// ```no_run
/// use hf_harvest::config::Config;
/// use hf_harvest::crawler::{run_harvest, HarvestPlan};
/// use hf_harvest::storage::JsonStateStore;
///
/// # async fn example() -> Result<(), hf_harvest::HarvestError> {
/// let plan = HarvestPlan { index: true, recurse: true, ..HarvestPlan::default() };
/// let summary = run_harvest(Config::default(), JsonStateStore::new("state.json"), plan).await?;
/// println!("{}", summary);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest<S: StateStore>(
    config: Config,
    store: S,
    plan: HarvestPlan,
) -> Result<CrawlSummary, HarvestError> {
    Harvester::new(config, store)?.run(plan).await
}
