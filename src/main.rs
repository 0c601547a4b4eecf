//! Sumi-Tide main entry point
//!
//! This is the command-line interface for the Sumi-Tide page fetcher.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use sumi_tide::config::{load_config_with_hash, Config};
use sumi_tide::crawler::{CallbackHooks, CrawlOptions, Crawler, Document};
use sumi_tide::output::{format_page_line, print_report};
use sumi_tide::target::inject_headers;
use sumi_tide::transport::HttpTransport;
use tracing_subscriber::EnvFilter;

/// Sumi-Tide: a queue-draining page fetcher
///
/// Sumi-Tide fetches every target in the configured queue, parses each
/// response as HTML and reports the result of every page, then prints a
/// summary once the whole queue has drained.
#[derive(Parser, Debug)]
#[command(name = "sumi-tide")]
#[command(version = "1.0.0")]
#[command(about = "A queue-draining page fetcher", long_about = None)]
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

    /// Show the request each target would be sent as, without fetching
    #[arg(long)]
    dry_run: bool,

    /// Print the text of elements matching this CSS selector for every page
    #[arg(long, value_name = "CSS")]
    select: Option<String>,

    /// Override the configured concurrency limit
    #[arg(long, value_name = "N")]
    max_concurrent: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_crawl(config, cli.select, cli.max_concurrent).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_tide=info,warn"),
            1 => EnvFilter::new("sumi_tide=debug,info"),
            2 => EnvFilter::new("sumi_tide=trace,debug"),
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

/// Handles the --dry-run mode: prints every resolved request
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Sumi-Tide Dry Run ===\n");

    println!("Crawler Configuration:");
    match config.crawler.max_concurrent {
        Some(limit) => println!("  Max concurrent: {}", limit),
        None => println!("  Max concurrent: unbounded"),
    }
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Connect timeout: {}s", config.crawler.connect_timeout_secs);
    println!("  User agent: {}", config.user_agent.header_value());

    let fixed = config.headers.as_ref();
    println!("\nFixed Headers ({}):", fixed.map_or(0, |h| h.len()));
    for (name, value) in fixed.into_iter().flatten() {
        println!("  {}: {}", name, value);
    }

    let targets = config.targets();
    println!("\nQueue ({}):", targets.len());
    for target in &targets {
        let params = inject_headers(target, fixed)?;
        println!("  - {} {}", params.method, params.url()?);
        for (name, value) in &params.headers {
            println!("      {}: {}", name, value);
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would dispatch {} requests", targets.len());

    Ok(())
}

/// Handles the main drain operation
async fn handle_crawl(
    config: Config,
    select: Option<String>,
    max_concurrent: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(selector) = &select {
        // Reject a bad selector before any request goes out
        Document::parse(b"").select(selector)?;
    }

    let transport = HttpTransport::from_config(&config.user_agent, &config.crawler)?;

    let hooks = CallbackHooks::new()
        .on_response(|ctx| {
            tracing::debug!(
                "{} -> {} ({})",
                ctx.target,
                ctx.response.status,
                ctx.response.content_type().unwrap_or("unknown type")
            );
        })
        .on_complete(move |ctx| {
            let title = ctx.document.title();
            println!(
                "{}",
                format_page_line(
                    &ctx.target.to_string(),
                    ctx.response.map(|r| r.status),
                    ctx.body.len(),
                    title.as_deref(),
                )
            );

            if let Some(selector) = &select {
                match ctx.document.select_text(selector) {
                    Ok(texts) => {
                        for text in texts.iter().filter(|t| !t.is_empty()) {
                            println!("    {}", text);
                        }
                    }
                    Err(e) => tracing::warn!("{}", e),
                }
            }
        })
        .on_error(|ctx| {
            tracing::warn!("{}", ctx.error);
        });

    let max_concurrency =
        max_concurrent.or(config.crawler.max_concurrent.map(|limit| limit as usize));

    let options = CrawlOptions {
        queue: config.targets(),
        headers: config.headers.clone(),
        hooks: Arc::new(hooks),
        max_concurrency,
    };

    tracing::info!(
        "Queued targets: {}, concurrency limit: {}",
        options.queue.len(),
        max_concurrency.map_or_else(|| "none".to_string(), |n| n.to_string())
    );

    let crawler = Crawler::new(options, Arc::new(transport));
    let start = Instant::now();
    let report = crawler.run().end().await;

    print_report(&report, start.elapsed());

    if report.is_clean() {
        tracing::info!("Drain completed successfully");
    } else {
        tracing::warn!("Drain completed with {} failed pages", report.failed);
    }

    Ok(())
}
