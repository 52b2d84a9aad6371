use std::io::{self, BufRead};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use newswire::cli::{Cli, Commands};
use newswire::config::Config;
use newswire::errors::{IngestError, IngestResult};
use newswire::services::{
    IngestionPlan, IngestionService, RunOutcome, RunReport, Scheduler, TriggerOutcome,
};
use newswire::sources::{FetcherRegistry, NewsApiFetcher, SyndicationFetcher};
use newswire::storage::sqlite::{SqliteArticleRepository, SqliteSourceRepository, SqliteStorage};

type Service = IngestionService<SqliteSourceRepository, SqliteArticleRepository>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> IngestResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize storage
    let storage = SqliteStorage::new(&config.db_path)?;
    let service = build_service(storage, &config);

    match cli.command {
        Commands::Run => cmd_run(&service),
        Commands::Watch { interval_ms } => cmd_watch(service, &config, interval_ms),
        Commands::Sources => cmd_sources(&service),
    }
}

fn build_service(storage: SqliteStorage, config: &Config) -> Service {
    let fetchers = FetcherRegistry::new()
        .with(Box::new(SyndicationFetcher::new(config.fetch_timeout)))
        .with(Box::new(NewsApiFetcher::new(
            &config.api_base_url,
            config.api_key.clone(),
            config.fetch_timeout,
        )));

    IngestionService::new(
        SqliteSourceRepository::new(storage.clone()),
        SqliteArticleRepository::new(storage),
        fetchers,
        IngestionPlan::from_config(config),
    )
}

fn cmd_run(service: &Service) -> IngestResult<()> {
    println!("Ingesting news...\n");

    match service.run() {
        RunOutcome::Completed(report) => print_report(&report),
        RunOutcome::Skipped => println!("An ingestion run is already in progress."),
    }

    println!("Catalog holds {} articles.", service.article_count()?);
    Ok(())
}

fn cmd_watch(service: Service, config: &Config, interval_ms: Option<u64>) -> IngestResult<()> {
    let interval = match interval_ms {
        Some(0) => {
            return Err(IngestError::Config(
                "--interval-ms must be greater than zero".to_string(),
            ))
        }
        Some(ms) => Duration::from_millis(ms),
        None => config.ingestion_interval,
    };

    println!(
        "Watching for news every {} ms. Press Enter to ingest now, Ctrl-D or Ctrl-C to stop.",
        interval.as_millis()
    );

    let scheduler = Scheduler::spawn(Arc::new(service), interval)?;

    // Each line on stdin requests an extra run; EOF stops watching
    for line in io::stdin().lock().lines() {
        line?;
        match scheduler.trigger() {
            TriggerOutcome::Accepted => println!("Ingestion requested."),
            TriggerOutcome::Skipped => println!("A run is already in progress, request ignored."),
            TriggerOutcome::Stopped => break,
        }
    }

    scheduler.shutdown();
    println!("Stopped.");
    Ok(())
}

fn cmd_sources(service: &Service) -> IngestResult<()> {
    let sources = service.sources()?;

    if sources.is_empty() {
        println!("No sources in the catalog.");
        return Ok(());
    }

    println!("Catalog sources:\n");
    for source in sources {
        println!("  {}", source.name);
        println!("    Base: {}", source.base_url);
        if let Some(feed_url) = &source.feed_url {
            println!("    Feed: {}", feed_url);
        }
        if let Some(key_ref) = &source.api_key_ref {
            println!("    Credential: {}", key_ref);
        }
        println!();
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    println!(
        "Sources: {} attempted, {} failed, {} skipped",
        report.sources_attempted, report.sources_failed, report.sources_skipped
    );
    println!(
        "Entries: {} seen, {} rejected, {} failed",
        report.entries_seen, report.entries_rejected, report.entry_failures
    );
    println!(
        "Articles: {} created, {} updated, {} unchanged",
        report.articles_created, report.articles_updated, report.articles_unchanged
    );
    println!(
        "Finished in {} ms\n",
        (report.finished_at - report.started_at).num_milliseconds()
    );
}
