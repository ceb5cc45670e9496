mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "finsent")]
#[command(about = "Financial tweet sentiment corpus and retrieval CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ingest a local batch file into the corpus and vector store.
    Ingest {
        /// Newline-delimited JSON batch file.
        file: PathBuf,
    },
    /// Pull unseen batch files from the configured bucket mirror.
    Sync {
        /// Partition prefix to scan (defaults to the configured one).
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Print the per-ticker sentiment pivot.
    Pivot {
        /// Hide tickers with fewer classified mentions than this.
        #[arg(long, default_value_t = 20)]
        min_mentions: u64,
    },
    /// Print the hourly sentiment trend series.
    Trend,
    /// Ask a question over the stored corpus.
    Ask {
        question: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = finsent_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Ingest { file } => commands::run_ingest(&config, &file).await,
        Commands::Sync { prefix } => commands::run_sync(&config, prefix.as_deref()).await,
        Commands::Pivot { min_mentions } => commands::run_pivot(&config, min_mentions).await,
        Commands::Trend => commands::run_trend(&config).await,
        Commands::Ask { question } => commands::run_ask(&config, &question).await,
    }
}
