//! Sashiko main entry point
//!
//! This is the command-line interface for the Sashiko catalog harvester.

use clap::Parser;
use sashiko::config::load_runtime_config;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Sashiko: a patient, resumable catalog harvester
///
/// Sashiko walks a paginated catalog under a wall-clock budget, extracts
/// detail records, and stores them in SQLite. Each invocation resumes from
/// a persisted page checkpoint, so a large catalog is harvested across
/// many scheduled runs.
#[derive(Parser, Debug)]
#[command(name = "sashiko")]
#[command(version = "0.3.0")]
#[command(about = "A patient, resumable catalog harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults apply if omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Resume from the saved page checkpoint (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Restart collection from page one; the dataset is kept
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what a run would do, without fetching
    #[arg(long, conflicts_with_all = ["stats", "export", "probe"])]
    dry_run: bool,

    /// Show dataset statistics and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export", "probe"])]
    stats: bool,

    /// Export the dataset to a CSV file and exit
    #[arg(long, value_name = "FILE", conflicts_with_all = ["dry_run", "stats", "probe"])]
    export: Option<PathBuf>,

    /// Render the first listing page and report what the selectors find
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "export"])]
    probe: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given; using built-in defaults"),
    }
    let config = match load_runtime_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(output) = &cli.export {
        handle_export(&config, output)?;
    } else if cli.probe {
        handle_probe(&config).await?;
    } else {
        handle_harvest(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sashiko=info,warn"),
            1 => EnvFilter::new("sashiko=debug,info"),
            2 => EnvFilter::new("sashiko=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what a run would do
fn handle_dry_run(config: &sashiko::config::Config) -> Result<(), Box<dyn std::error::Error>> {
    use sashiko::config::catalog_fingerprint;
    use sashiko::store::CheckpointStore;

    println!("=== Sashiko Dry Run ===\n");

    println!("Catalog:");
    println!("  Base URL: {}", config.catalog.base_url);
    println!("  Max pages: {}", config.catalog.max_pages);
    println!("  Path prefixes:");
    for prefix in &config.catalog.path_prefixes {
        println!("    - {}", prefix);
    }

    println!("\nSelectors:");
    println!("  List container: {}", config.catalog.selectors.list_container);
    println!("  Item link: {}", config.catalog.selectors.item_link);
    println!("  Title: {}", config.catalog.selectors.title);
    println!("  Subtitle: {}", config.catalog.selectors.subtitle);
    println!("  Body: {}", config.catalog.selectors.body);

    println!("\nRun:");
    println!("  Data directory: {}", config.run.data_dir.display());
    println!(
        "  Runtime budget: {}s (safety margin {}s)",
        config.run.max_runtime_secs, config.run.safety_margin_secs
    );
    println!("  Max new URLs per run: {}", config.run.max_urls_per_run);
    println!("  Pages per batch: {}", config.run.pages_per_batch);
    println!("  Flush threshold: {}", config.run.flush_threshold);

    println!("\nPoliteness:");
    println!("  Listing delay: {}s", config.politeness.listing_delay_secs);
    println!("  Detail delay: {}s", config.politeness.detail_delay_secs);
    println!(
        "  Retries: up to {} attempts, {}s apart",
        config.politeness.retry_ceiling, config.politeness.retry_delay_secs
    );

    println!("\nRenderer:");
    println!("  Kind: {:?}", config.renderer.kind);
    println!("  Settle delay: {}s", config.renderer.settle_secs);
    println!("  Request timeout: {}s", config.renderer.request_timeout_secs);

    let checkpoint = CheckpointStore::new(
        &config.run.data_dir,
        &catalog_fingerprint(&config.catalog),
    );
    let next_page = checkpoint.load() + 1;

    println!("\n✓ Configuration is valid");
    println!("✓ Next run would start from listing page {}", next_page);

    Ok(())
}

/// Handles the --stats mode: shows statistics from the dataset
fn handle_stats(config: &sashiko::config::Config) -> Result<(), Box<dyn std::error::Error>> {
    use sashiko::config::catalog_fingerprint;
    use sashiko::export::{load_statistics, print_statistics};
    use sashiko::store::{dataset_path, CheckpointStore, SqliteDataset};

    let db_path = dataset_path(&config.run.data_dir);
    println!("Database: {}\n", db_path.display());

    let dataset = SqliteDataset::open(&db_path)?;
    let checkpoint = CheckpointStore::new(
        &config.run.data_dir,
        &catalog_fingerprint(&config.catalog),
    );

    let stats = load_statistics(&dataset, &checkpoint)?;
    print_statistics(&stats, config.catalog.max_pages);

    Ok(())
}

/// Handles the --export mode: writes the dataset to a CSV file
fn handle_export(
    config: &sashiko::config::Config,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    use sashiko::export::export_csv;
    use sashiko::store::{dataset_path, SqliteDataset};

    let db_path = dataset_path(&config.run.data_dir);
    println!("=== Exporting Dataset ===\n");
    println!("Database: {}", db_path.display());
    println!("Output: {}", output.display());
    println!();

    let dataset = SqliteDataset::open(&db_path)?;
    let written = export_csv(&dataset, output)?;

    println!("✓ Exported {} records to: {}", written, output.display());

    Ok(())
}

/// Handles the --probe mode: renders the first listing page and reports
/// what the configured selectors find on it
async fn handle_probe(config: &sashiko::config::Config) -> Result<(), Box<dyn std::error::Error>> {
    use sashiko::catalog::probe_listing;

    println!("=== Probing Catalog ===\n");
    println!("Base URL: {}", config.catalog.base_url);
    println!("Renderer: {:?}", config.renderer.kind);
    println!();

    let mut renderer = sashiko::render::acquire(&config.renderer).await?;
    let outcome = renderer.render(&config.catalog.base_url).await;
    renderer.close().await;
    let html = outcome?;

    let report = probe_listing(&html, &config.catalog)?;

    if !report.container_found {
        println!(
            "✗ List container '{}' did not match anything",
            config.catalog.selectors.list_container
        );
        println!("  Either the page did not render or the selector is stale.");
        return Ok(());
    }

    println!("✓ List container matched");
    println!("  Anchors inside: {}", report.anchors);
    println!("  Accepted detail links: {}", report.accepted.len());
    println!("  Filtered out: {}", report.rejected);

    if !report.accepted.is_empty() {
        println!("\nFirst links:");
        for url in report.accepted.iter().take(5) {
            println!("  - {}", url);
        }
    }

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: sashiko::config::Config,
    fresh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    use sashiko::store::{dataset_path, SqliteDataset};
    use sashiko::Harvester;
    use std::sync::atomic::Ordering;

    if fresh {
        tracing::info!("Starting from page one (checkpoint cleared, dataset kept)");
    } else {
        tracing::info!("Starting harvest (resumes from the saved checkpoint)");
    }

    std::fs::create_dir_all(&config.run.data_dir)?;
    let dataset = SqliteDataset::open(&dataset_path(&config.run.data_dir))?;
    let renderer = sashiko::render::acquire(&config.renderer).await?;

    let mut harvester = Harvester::new(config, renderer, dataset)?;
    if fresh {
        harvester.reset_checkpoint()?;
    }

    // Ctrl-C asks the run to stop at the next page boundary
    let shutdown = harvester.shutdown_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; stopping at the next page boundary");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    let outcome = harvester.run().await;
    harvester.close().await;

    match outcome {
        Ok(summary) => {
            println!("\n=== Run Summary ===");
            println!("  Stopped: {}", summary.stop);
            println!("  Listing pages visited: {}", summary.pages_visited);
            println!("  New URLs collected: {}", summary.urls_collected);
            println!(
                "  Details fetched: {} ({} complete, {} partial, {} failed)",
                summary.details_fetched, summary.complete, summary.partial, summary.failed
            );
            println!("  Records inserted: {}", summary.records_inserted);
            println!("  Elapsed: {:?}", summary.elapsed);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
