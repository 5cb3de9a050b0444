//! Sumi-Folio main entry point
//!
//! This is the command-line interface for the Sumi-Folio site crawler.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use sumi_folio::config::{parse_config, validate, Config, OutputFormat};
use sumi_folio::crawler::{Coordinator, CrawlEvent};
use sumi_folio::output::{assemble, write_document, DocumentMeta};
use sumi_folio::CrawlState;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

/// Sumi-Folio: a polite site-to-document crawler
///
/// Sumi-Folio crawls a website breadth-first up to a bounded depth, extracts
/// the main content of every page, and writes everything into one document
/// whose links between collected pages jump to the right section.
#[derive(Parser, Debug)]
#[command(name = "sumi-folio")]
#[command(version = "1.0.0")]
#[command(about = "A polite site-to-document crawler", long_about = None)]
struct Cli {
    /// Starting URL to crawl (may come from the config file instead)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Maximum crawling depth
    #[arg(long)]
    depth: Option<u32>,

    /// Output document path (.html or .md)
    #[arg(long)]
    output: Option<String>,

    /// Only crawl pages on the start URL's host
    #[arg(long)]
    same_domain: bool,

    /// Number of retries for failed requests
    #[arg(long)]
    retries: Option<u32>,

    /// Number of concurrent fetch workers
    #[arg(long)]
    concurrency: Option<u32>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format (inferred from the output path when absent)
    #[arg(long, value_parser = parse_format)]
    format: Option<OutputFormat>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    match value.to_ascii_lowercase().as_str() {
        "html" => Ok(OutputFormat::Html),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        other => Err(format!("unknown format '{}', expected html or markdown", other)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_folio=info,warn"),
            1 => EnvFilter::new("sumi_folio=debug,info"),
            2 => EnvFilter::new("sumi_folio=trace,debug"),
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

/// Loads the optional config file and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            parse_config(path)
                .with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(url) = &cli.url {
        config.crawler.start_url = url.clone();
    }
    if let Some(depth) = cli.depth {
        config.crawler.max_depth = depth;
    }
    if cli.same_domain {
        config.crawler.same_domain_only = true;
    }
    if let Some(retries) = cli.retries {
        config.crawler.retry_count = retries;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    if let Some(output) = &cli.output {
        config.output.path = output.clone();
    }
    if let Some(format) = cli.format {
        config.output.format = Some(format);
    }

    if config.crawler.start_url.is_empty() {
        bail!("no start URL given; pass one on the command line or set crawler.start-url");
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let output_config = config.output.clone();
    let max_depth = config.crawler.max_depth;

    let mut coordinator = Coordinator::new(config).context("failed to start crawl")?;
    let start_url = coordinator.start_url().to_string();

    // Collect failures for the closing report
    let mut events = coordinator.subscribe();
    let failures = tokio::spawn(async move {
        let mut failed = Vec::new();
        loop {
            match events.recv().await {
                Ok(CrawlEvent::PageCompleted {
                    url,
                    error: Some(error),
                    ..
                }) => failed.push((url, error)),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Event listener skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
        failed
    });

    let cancel = coordinator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            cancel.cancel();
        }
    });

    let report = coordinator.run().await.context("crawl aborted")?;
    let storage = coordinator.storage();
    drop(coordinator);

    // Write whatever was collected, even after a stop or failure
    let meta = DocumentMeta::new(start_url, max_depth).with_title(output_config.title.clone());
    let document = assemble(&storage, meta);
    write_document(&document, &output_config)
        .with_context(|| format!("failed to write {}", output_config.path))?;

    let failed = failures.await.unwrap_or_default();
    if !failed.is_empty() {
        tracing::warn!("{} pages could not be scraped:", failed.len());
        for (url, error) in &failed {
            tracing::warn!("  {} - {}", url, error);
        }
    }

    tracing::info!(
        "Crawl {}: visited {} pages ({} failed), discovered {} URLs in {:.1}s",
        report.state,
        report.pages_processed,
        report.pages_failed,
        report.urls_discovered,
        report.elapsed.as_secs_f64()
    );
    println!("Document saved as {}", output_config.path);

    if report.state == CrawlState::Failed {
        bail!("crawl failed; partial document written to {}", output_config.path);
    }

    Ok(())
}
