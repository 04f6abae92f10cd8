//! Mambu-Docs: a documentation harvester for the Mambu API reference
//!
//! This crate crawls one documentation site (one API version at a time),
//! extracts every endpoint and prose page into a normalized document model,
//! renders it as a structured JSON artifact and a narrative Markdown artifact,
//! and publishes the Markdown to a remote folder after archiving the previous
//! generation.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod publish;
pub mod retry;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, CrawlOutcome};
pub use model::{Document, Endpoint, Page, Parameter};
pub use publish::{PublishManager, PublishResult};
pub use state::{RunState, UrlState, VisitOutcome};
pub use crate::url::{canonicalize, extract_domain, route_path};
