//! File downloads
//!
//! Downloads run through the same windowed batches as page fetches. Each
//! worker owns one [`DownloadTarget`]; a failure ends that worker only and is
//! reported back instead of stopping its siblings. Nothing is retried.

use crate::crawler::batch::run_windowed;
use crate::links::NamePolicy;
use crate::HarvestError;
use reqwest::Client;
use std::path::{Path, PathBuf};

/// A file URL paired with the local path it is saved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: String,
    pub path: PathBuf,
}

impl DownloadTarget {
    /// Pairs `url` with its name under `dir`
    pub fn new(url: impl Into<String>, dir: &Path, namer: &NamePolicy) -> Self {
        let url = url.into();
        let path = dir.join(namer.name_for(&url));
        Self { url, path }
    }

    /// Sibling path the bytes are written to before the final rename
    fn partial_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".part");
        self.path.with_file_name(name)
    }
}

/// Outcome of a download batch
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// Files written, as (url, path)
    pub saved: Vec<(String, PathBuf)>,

    /// Files that failed, as (url, error message)
    pub failed: Vec<(String, String)>,

    /// Workers that panicked and reported nothing
    pub aborted: usize,
}

impl DownloadReport {
    /// Returns true if `url` was written to disk
    pub fn was_saved(&self, url: &str) -> bool {
        self.saved.iter().any(|(saved, _)| saved == url)
    }
}

/// Downloads one file
///
/// The body is written to `<name>.part` and renamed into place once complete,
/// so an interrupted download never leaves a truncated file under the final
/// name. Two URLs deriving the same name race on the same path.
pub async fn download_file(client: &Client, target: &DownloadTarget) -> Result<PathBuf, HarvestError> {
    tracing::info!("Downloading recipe: {}", target.path.display());

    let response = client
        .get(&target.url)
        .send()
        .await
        .map_err(|source| HarvestError::Http {
            url: target.url.clone(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(HarvestError::DownloadStatus {
            url: target.url.clone(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(|source| HarvestError::Http {
        url: target.url.clone(),
        source,
    })?;

    let partial = target.partial_path();
    if let Err(e) = tokio::fs::write(&partial, &bytes).await {
        tokio::fs::remove_file(&partial).await.ok();
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&partial, &target.path).await {
        tokio::fs::remove_file(&partial).await.ok();
        return Err(e.into());
    }

    tracing::debug!("Saved {} bytes to {}", bytes.len(), target.path.display());
    Ok(target.path.clone())
}

/// Downloads many files into `dir`, `concurrency` at a time
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `namer` - Derives each file's name from its URL
/// * `urls` - File URLs to download
/// * `dir` - Existing directory the files are written to
/// * `concurrency` - Window size
pub async fn download_files(
    client: &Client,
    namer: &NamePolicy,
    urls: Vec<String>,
    dir: &Path,
    concurrency: usize,
) -> DownloadReport {
    let targets: Vec<DownloadTarget> = urls
        .into_iter()
        .map(|url| DownloadTarget::new(url, dir, namer))
        .collect();

    let outcome = run_windowed(targets, concurrency, |target| {
        let client = client.clone();
        async move {
            let result = download_file(&client, &target).await;
            (target.url, result)
        }
    })
    .await;

    let mut report = DownloadReport {
        aborted: outcome.aborted,
        ..DownloadReport::default()
    };

    for (url, result) in outcome.results {
        match result {
            Ok(path) => report.saved.push((url, path)),
            Err(e) => {
                tracing::warn!("Failed to download {}: {}", url, e);
                report.failed.push((url, e.to_string()));
            }
        }
    }

    report
}
