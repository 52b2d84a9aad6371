use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "newswire")]
#[command(about = "News ingestion pipeline merging syndication feeds and news API results")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one ingestion cycle over every configured feed and topic
    Run,

    /// Keep ingesting on a timer until interrupted or stdin closes
    ///
    /// Press Enter to trigger an extra run.
    Watch {
        /// Milliseconds between runs (overrides NEWS_INGESTION_RATE_MS)
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// List the sources in the catalog
    Sources,
}
