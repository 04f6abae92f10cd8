//! Configuration module for Mambu-Docs
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use mambu_docs::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mambu-docs.toml")).unwrap();
//! println!("Crawling at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    api_version_url, Config, CrawlerConfig, ExtractorConfig, OutputConfig, PublishConfig,
    RendererConfig, RendererKind, RetryConfig, UserAgentConfig, MAMBU_API_URL,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_crawler_config, MAX_WORKERS};
