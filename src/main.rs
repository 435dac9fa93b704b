//! Sumi-Search main entry point
//!
//! This is the command-line interface for crawling a site and querying the
//! resulting search index.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sumi_search::config::{load_config, Config};
use sumi_search::crawler::{CrawlController, JobRequest, ProgressEvent};
use sumi_search::ranking::RankWeights;
use sumi_search::storage::{open_storage, DocumentStore, JobStore, SqliteStorage};
use sumi_search::{Scope, SearchEngine};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Sumi-Search: a polite site crawler with hybrid search
///
/// Sumi-Search crawls one website in short resumable batches, respecting
/// robots.txt and per-host rate limits, and answers queries with a blend of
/// BM25 relevance, PageRank authority and title matching.
#[derive(Parser, Debug)]
#[command(name = "sumi-search")]
#[command(version)]
#[command(about = "A polite site crawler with hybrid search", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used if omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site starting from URL
    Crawl {
        url: String,

        /// Maximum link depth from the start URL
        #[arg(long)]
        depth: Option<u32>,

        /// Maximum number of pages visited
        #[arg(long)]
        pages: Option<usize>,

        /// Crawl scope: host or domain
        #[arg(long)]
        scope: Option<Scope>,

        /// Seed the frontier from /sitemap.xml
        #[arg(long)]
        sitemap: bool,

        /// Print progress events as JSON lines instead of running batches
        #[arg(long)]
        stream: bool,

        /// Do not store crawled documents (streaming only)
        #[arg(long, requires = "stream")]
        no_save: bool,
    },

    /// Continue a pending crawl job until it completes
    Resume {
        job_id: String,
    },

    /// Search the index
    Search {
        query: String,

        /// Number of results
        #[arg(short)]
        k: Option<usize>,

        /// Constant share of the BM25 score
        #[arg(long)]
        alpha: Option<f64>,

        /// Weight of the normalized PageRank
        #[arg(long)]
        beta: Option<f64>,
    },

    /// Suggest query completions
    Suggest {
        prefix: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show index statistics
    Stats,

    /// Delete old completed crawl jobs
    Cleanup {
        /// Age in days after which completed jobs are removed
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Crawl {
            url,
            depth,
            pages,
            scope,
            sitemap,
            stream,
            no_save,
        } => {
            let mut request = JobRequest::new(url, &config.crawler);
            request.max_depth = depth.unwrap_or(request.max_depth);
            request.max_pages = pages.unwrap_or(request.max_pages);
            request.scope = scope.unwrap_or(request.scope);
            request.sitemap |= sitemap;

            if stream {
                handle_stream(&config, request, !no_save).await
            } else {
                handle_crawl(&config, request).await
            }
        }
        Command::Resume { job_id } => handle_resume(&config, &job_id).await,
        Command::Search {
            query,
            k,
            alpha,
            beta,
        } => handle_search(&config, &query, k, alpha, beta),
        Command::Suggest { prefix, limit } => handle_suggest(&config, &prefix, limit),
        Command::Stats => handle_stats(&config),
        Command::Cleanup { days } => handle_cleanup(&config, days),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_search=info,warn"),
            1 => EnvFilter::new("sumi_search=debug,info"),
            2 => EnvFilter::new("sumi_search=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or the defaults when none is given
fn load(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let loaded = load_config(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded (sha256 {})", loaded.fingerprint);
    Ok(loaded.config)
}

fn open(config: &Config) -> Result<Arc<SqliteStorage>> {
    let storage = open_storage(&config.output.database_path).with_context(|| {
        format!(
            "Failed to open database {}",
            config.output.database_path.display()
        )
    })?;
    Ok(Arc::new(storage))
}

fn controller(config: &Config, storage: Arc<SqliteStorage>) -> Result<CrawlController> {
    let documents: Arc<dyn DocumentStore> = storage.clone();
    let jobs: Arc<dyn JobStore> = storage;
    CrawlController::new(config, documents, jobs).context("Failed to build crawl controller")
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Creates a job and runs its batches to completion
async fn handle_crawl(config: &Config, request: JobRequest) -> Result<()> {
    let storage = open(config)?;
    let controller = controller(config, storage)?;

    let id = controller
        .create_job_with(request)
        .await
        .context("Failed to create crawl job")?;
    println!("Job: {}", id);

    let job = controller.run_to_completion(&id).await?;
    print_json(&job.stats)
}

/// Runs a streaming crawl, printing one JSON event per line
async fn handle_stream(config: &Config, request: JobRequest, save: bool) -> Result<()> {
    let storage = open(config)?;
    let controller = controller(config, storage)?;
    let (tx, mut rx) = mpsc::channel::<ProgressEvent>(32);

    let printer = async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!("Failed to encode progress event: {}", e),
            }
        }
    };

    let (result, ()) = tokio::join!(controller.stream_crawl(request, save, tx), printer);
    result.context("Streaming crawl failed")?;
    Ok(())
}

async fn handle_resume(config: &Config, id: &str) -> Result<()> {
    let storage = open(config)?;
    let controller = controller(config, storage)?;

    let job = controller
        .run_to_completion(id)
        .await
        .with_context(|| format!("Failed to resume job {}", id))?;
    print_json(&job.stats)
}

fn handle_search(
    config: &Config,
    query: &str,
    k: Option<usize>,
    alpha: Option<f64>,
    beta: Option<f64>,
) -> Result<()> {
    let engine = SearchEngine::with_config(open(config)?, config.search.clone());
    let defaults = config.search.weights();
    let weights = RankWeights {
        alpha: alpha.unwrap_or(defaults.alpha),
        beta: beta.unwrap_or(defaults.beta),
        ..defaults
    };

    let response = engine.search_with(query, &weights, k.unwrap_or(config.search.k))?;
    print_json(&response)
}

fn handle_suggest(config: &Config, prefix: &str, limit: Option<usize>) -> Result<()> {
    let engine = SearchEngine::with_config(open(config)?, config.search.clone());
    print_json(&engine.suggest(prefix, limit)?)
}

fn handle_stats(config: &Config) -> Result<()> {
    let engine = SearchEngine::with_config(open(config)?, config.search.clone());
    print_json(&engine.stats()?)
}

fn handle_cleanup(config: &Config, days: i64) -> Result<()> {
    let controller = controller(config, open(config)?)?;
    let deleted = controller.cleanup_completed_jobs(chrono::Duration::days(days))?;
    println!("Removed {} completed jobs", deleted);
    Ok(())
}
