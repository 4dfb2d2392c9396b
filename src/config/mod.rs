//! Configuration module for hf-harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Running without a file is fine: [`Config::default`] describes the public site.
//!
//! # Example
//!
//! ```no_run
//! use hf_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Downloading {} files at a time", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
