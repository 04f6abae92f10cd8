//! Mambu-Docs main entry point
//!
//! This is the command-line interface for the Mambu API documentation harvester.

use anyhow::{bail, Context, Result};
use clap::Parser;
use mambu_docs::config::{load_config_with_hash, validate, Config};
use mambu_docs::crawler::{run_crawl, CrawlError};
use mambu_docs::model::LanguageFilter;
use mambu_docs::output::{print_summary, render_artifacts};
use mambu_docs::storage::LocalArtifactWriter;
use mambu_docs::{CrawlOutcome, PublishManager};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Mambu-Docs: harvests the Mambu API reference into publishable documents
///
/// Mambu-Docs crawls one API version of the documentation site, extracts
/// endpoints and prose pages, writes a JSON and a Markdown artifact, and
/// publishes the Markdown after archiving the previous generation.
#[derive(Parser, Debug)]
#[command(name = "mambu-docs")]
#[command(version = "1.0.0")]
#[command(about = "Mambu API documentation harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// API version to scrape (v1, v2, payments, streaming, ...)
    #[arg(long, value_name = "VERSION")]
    api_version: Option<String>,

    /// Code-sample languages to keep: "all" or a comma-separated list
    #[arg(long, value_name = "LANGUAGES")]
    language: Option<String>,

    /// Upper bound on the number of pages fetched
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "publish_only")]
    dry_run: bool,

    /// Crawl and write artifacts locally, skip the remote publish
    #[arg(long, conflicts_with = "publish_only")]
    no_publish: bool,

    /// Publish an existing narrative artifact without crawling
    #[arg(long, value_name = "FILE")]
    publish_only: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid configuration after command-line overrides")?;

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else if let Some(path) = &cli.publish_only {
        handle_publish_only(&config, path).await
    } else {
        handle_crawl(&config, cli.no_publish).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("mambu_docs=info,warn"),
            1 => EnvFilter::new("mambu_docs=debug,info"),
            2 => EnvFilter::new("mambu_docs=trace,debug"),
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

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(version) = &cli.api_version {
        config.crawler.api_version = version.clone();
    }
    if let Some(languages) = &cli.language {
        config.crawler.language_filter = LanguageFilter::parse(languages);
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    let crawler = &config.crawler;
    println!("=== Mambu-Docs Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  API version: {}", crawler.api_version);
    println!("  Version filter: {}", crawler.effective_version_filter());
    println!("  Languages: {}", crawler.language_filter);
    println!("  Max pages: {}", crawler.max_pages);
    println!("  Workers: {}", crawler.workers);
    println!("  Inter-page delay: {}ms", crawler.inter_page_delay);
    println!("  Fetch timeout: {}ms", crawler.fetch_timeout);
    println!(
        "  Retry: {} attempts, {}ms base delay, x{}",
        crawler.retry.max_attempts, crawler.retry.base_delay, crawler.retry.multiplier
    );

    println!("\nStart URLs:");
    for url in crawler.effective_start_urls() {
        println!("  - {}", url);
    }
    if let Some(sitemap) = &crawler.sitemap_url {
        println!("  Sitemap: {}", sitemap);
    }

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Artifact prefix: {}", config.output.artifact_prefix);

    println!("\nPublish:");
    if config.publish.enabled {
        println!(
            "  {} -> {} (archive: {})",
            config.publish.store_root.as_deref().unwrap_or("-"),
            config.publish.target,
            config.publish.archive
        );
    } else {
        println!("  disabled");
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --publish-only mode: archives and uploads an existing artifact
async fn handle_publish_only(config: &Config, path: &Path) -> Result<()> {
    let manager = PublishManager::from_config(config).context("cannot publish")?;
    let result = manager
        .publish_existing(path, &config.crawler.api_version)
        .await
        .with_context(|| format!("failed to publish {}", path.display()))?;

    println!("✓ Published {} as {}", result.name, result.object_id);
    println!("  Archived {} previous files", result.archived.len());
    Ok(())
}

/// Handles the main crawl, render and publish operation
async fn handle_crawl(config: &Config, no_publish: bool) -> Result<()> {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            on_signal.cancel();
        }
    });

    tracing::info!(
        "Starting crawl of API version {} ({} workers)",
        config.crawler.api_version,
        config.crawler.workers
    );

    let outcome = match run_crawl(config, cancel).await {
        Ok(outcome) => outcome,
        Err(CrawlError::Aborted(partial)) => {
            print_summary(&partial.summary);
            persist_locally(config, &partial).await?;
            bail!("crawl aborted, partial artifacts written to {}", config.output.directory);
        }
        Err(e) => return Err(e).context("crawl failed"),
    };

    print_summary(&outcome.summary);

    if no_publish || !config.publish.enabled {
        persist_locally(config, &outcome).await?;
        return Ok(());
    }

    let artifacts = render_artifacts(&outcome.document, &config.output.artifact_prefix)
        .context("failed to render artifacts")?;
    let manager = PublishManager::from_config(config).context("cannot publish")?;
    let result = manager
        .publish(&artifacts, &outcome.document.version)
        .await
        .context("publish failed; local artifacts were kept")?;

    println!("\n✓ Published {} as {}", result.name, result.object_id);
    for path in &result.local_paths {
        println!("  Local copy: {}", path.display());
    }
    Ok(())
}

async fn persist_locally(config: &Config, outcome: &CrawlOutcome) -> Result<()> {
    let artifacts = render_artifacts(&outcome.document, &config.output.artifact_prefix)
        .context("failed to render artifacts")?;
    let writer = LocalArtifactWriter::new(&config.output.directory);
    for path in writer.write_all(&artifacts).await.context("failed to write artifacts")? {
        println!("✓ Wrote {}", path.display());
    }
    Ok(())
}
