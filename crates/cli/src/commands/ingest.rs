//! `forkmap ingest`.

use anyhow::{Context, Result};

use forkmap_client::{FetchConfig, Fetcher, ReqwestTransport};
use forkmap_core::{AppConfig, Database, JsonFileCache};

use crate::ingest::{IngestConfig, IngestReport, Ingestor};

pub async fn run(config: &AppConfig, json: bool) -> Result<()> {
    let cache = JsonFileCache::load(&config.cache_path).await;
    let transport = ReqwestTransport::new(&FetchConfig::from_app(config))?;
    let fetcher = Fetcher::new(Box::new(transport), Box::new(cache)).with_bearer(config.yelp_api_key.clone());

    let db = Database::open(&config.db_path)
        .await
        .with_context(|| format!("opening {}", config.db_path.display()))?;

    if let Err(missing) = config.require_yelp_api_key() {
        tracing::warn!(%missing, "searches not already cached will fail");
    }

    let mut ingestor = Ingestor::new(fetcher, db, IngestConfig::from_app(config));
    let report = ingestor.run().await.context("ingestion run aborted")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &IngestReport) {
    let elapsed = report.finished_at - report.started_at;
    println!(
        "ingested {} cities and {} restaurants in {:.1}s ({} ignored as already stored, {} records skipped)",
        report.cities,
        report.restaurants_inserted,
        elapsed.num_milliseconds() as f64 / 1000.0,
        report.restaurants_ignored,
        report.records_skipped,
    );

    if !report.truncated_cities.is_empty() {
        println!("first page only for: {}", report.truncated_cities.join(", "));
    }

    for failure in &report.failures {
        println!("failed #{} {}: {}", failure.rank, failure.city, failure.error);
    }
}
