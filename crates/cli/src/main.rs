//! forkmap command-line entry point.
//!
//! Logging goes to stderr so command output on stdout stays pipeable.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use forkmap_core::AppConfig;

mod commands;
mod ingest;

#[derive(Debug, Parser)]
#[command(name = "forkmap")]
#[command(about = "Collect and explore restaurant data for the most populous U.S. cities")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rebuild both tables from the city list and per-city business searches.
    Ingest {
        /// Print the run report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List stored cities in rank order.
    Cities,
    /// Best rated restaurants of a city.
    Top {
        city: String,
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// Stored details of a restaurant.
    Detail { city: String, name: String },
    /// Select restaurant columns with equality filters.
    Query {
        /// Comma-separated column names.
        #[arg(long, value_delimiter = ',', required = true)]
        columns: Vec<String>,
        /// Equality filter, repeatable.
        #[arg(long = "where", value_name = "COLUMN=VALUE")]
        filters: Vec<String>,
    },
    /// Inspect or clear the response cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Debug, Subcommand)]
enum CacheAction {
    /// Entry counts per namespace.
    Stats,
    /// Drop every cached response.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = AppConfig::load()?;

    match cli.command {
        Commands::Ingest { json } => commands::ingest::run(&config, json).await?,
        Commands::Cities => commands::browse::cities(&config).await?,
        Commands::Top { city, limit } => commands::browse::top(&config, &city, limit).await?,
        Commands::Detail { city, name } => commands::browse::detail(&config, &city, &name).await?,
        Commands::Query { columns, filters } => commands::query::run(&config, &columns, &filters).await?,
        Commands::Cache { action: CacheAction::Stats } => commands::cache::stats(&config).await,
        Commands::Cache { action: CacheAction::Clear } => commands::cache::clear(&config).await?,
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
