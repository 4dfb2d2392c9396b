//! hf-harvest main entry point
//!
//! This is the command-line interface for the recipe PDF harvester.

use anyhow::Context;
use clap::{ArgGroup, Parser};
use hf_harvest::config::{load_config_with_hash, validate, Config};
use hf_harvest::crawler::{run_harvest, HarvestPlan};
use hf_harvest::input::read_url_list;
use hf_harvest::storage::JsonStateStore;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// hf-harvest: downloads recipe cards as PDFs
///
/// Crawls recipe listing pages, finds the PDF recipe card linked from each
/// recipe page and downloads it. Recipes finished by earlier runs are
/// remembered in a state file and skipped.
#[derive(Parser, Debug)]
#[command(name = "hf-harvest")]
#[command(version)]
#[command(about = "Downloads recipe cards as PDFs", long_about = None)]
#[command(
    after_help = "Example: hf-harvest -u https://www.hellofresh.com/recipes/peppercorn-steak-w06-5857fcd16121bb11c124f383"
)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .multiple(true)
        .args(["all", "any", "url", "list_url", "file"])
))]
struct Cli {
    /// Get all recipes through the sitemap letter pages
    #[arg(short = 'A', long)]
    all: bool,

    /// Get recipes from the recipe index page
    #[arg(short = 'a', long)]
    any: bool,

    /// Follow recipe category pages found on listing pages
    #[arg(short, long)]
    recurse: bool,

    /// A single recipe URL
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,

    /// A listing page with recipes
    #[arg(short, long = "list-url", value_name = "URL")]
    list_url: Option<String>,

    /// Text file with one recipe URL per line
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// State file with already processed recipes
    #[arg(long, value_name = "PATH")]
    state: Option<PathBuf>,

    /// Directory downloads are written to
    #[arg(short, long, value_name = "DIR")]
    download_dir: Option<PathBuf>,

    /// Number of requests made at once
    #[arg(short, long, value_name = "N")]
    threads: Option<usize>,

    /// Keep all sitemap downloads in one directory instead of one per letter
    #[arg(long)]
    flat: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_settings(&cli)?;
    let plan = build_plan(&cli)?;

    tracing::info!(
        "Writing files to {} with {} requests at a time",
        config.output.download_dir,
        config.crawler.concurrency
    );

    let store = JsonStateStore::new(&config.output.state_path);
    let summary = run_harvest(config, store, plan)
        .await
        .context("Harvest failed")?;

    summary.log();
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("hf_harvest=info,warn"),
            1 => EnvFilter::new("hf_harvest=debug,info"),
            2 => EnvFilter::new("hf_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (or defaults) and applies command-line overrides
fn load_settings(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(state) = &cli.state {
        config.output.state_path = state.to_string_lossy().into_owned();
    }
    if let Some(dir) = &cli.download_dir {
        config.output.download_dir = dir.to_string_lossy().into_owned();
    }
    if let Some(threads) = cli.threads {
        config.crawler.concurrency = threads;
    }
    if cli.flat {
        config.output.organize_by_letter = false;
    }

    validate(&config).context("Invalid settings")?;
    Ok(config)
}

/// Translates the mode flags into a harvest plan
fn build_plan(cli: &Cli) -> anyhow::Result<HarvestPlan> {
    let mut recipe_urls = Vec::new();
    if let Some(path) = &cli.file {
        recipe_urls.extend(
            read_url_list(path).with_context(|| format!("Failed to read {}", path.display()))?,
        );
    }
    if let Some(url) = &cli.url {
        recipe_urls.push(url.clone());
    }

    Ok(HarvestPlan {
        index: cli.any,
        recurse: cli.recurse,
        recipe_urls,
        list_url: cli.list_url.clone(),
        all: cli.all,
    })
}
