//! Crawler module for page fetching and file downloading
//!
//! This module contains the core harvesting logic, including:
//! - Windowed concurrent batches
//! - HTTP fetching with soft failures
//! - HTML link extraction
//! - File downloads
//! - Overall harvest coordination

mod batch;
mod coordinator;
mod downloader;
mod fetcher;
mod parser;
mod summary;

pub use batch::{run_windowed, window_count, BatchOutcome};
pub use coordinator::{run_harvest, HarvestPlan, Harvester};
pub use downloader::{download_file, download_files, DownloadReport, DownloadTarget};
pub use fetcher::{build_http_client, fetch_page, fetch_pages, FetchOutcome};
pub use parser::{extract_links, extract_links_from};
pub use summary::CrawlSummary;
