//! Ingestion run: city list first, then one business search per city.
//!
//! The run is strictly sequential. Steps:
//!
//! 1. Fetch and parse the ranked city table (any failure stops the run)
//! 2. Replace the `cities` table
//! 3. Recreate the `restaurants` table
//! 4. For each city in rank order, search and insert its businesses
//!
//! A failed search only costs that city, including a search that needs the
//! network while no API key is configured. Store failures stop the run.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use forkmap_client::{Fetcher, SearchConfig, extract_cities, search_businesses};
use forkmap_core::{AppConfig, City, Database, Error};

/// Settings for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub wiki_url: String,
    /// Data rows to take from the city table.
    pub city_count: usize,
    /// Pause after each parsed city row.
    pub row_delay: Duration,
    pub search: SearchConfig,
}

impl IngestConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            wiki_url: config.wiki_url.clone(),
            city_count: config.city_count,
            row_delay: config.scrape_row_delay(),
            search: SearchConfig::from_app(config),
        }
    }
}

/// A city whose business search failed.
#[derive(Debug, Clone, Serialize)]
pub struct CityFailure {
    pub rank: u32,
    pub city: String,
    pub error: String,
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cities: usize,
    pub restaurants_inserted: usize,
    /// Businesses already stored under an earlier city.
    pub restaurants_ignored: usize,
    /// Records dropped by the extractor (duplicates and malformed).
    pub records_skipped: usize,
    /// Cities with more upstream matches than one page holds.
    pub truncated_cities: Vec<String>,
    pub failures: Vec<CityFailure>,
}

impl IngestReport {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            cities: 0,
            restaurants_inserted: 0,
            restaurants_ignored: 0,
            records_skipped: 0,
            truncated_cities: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Drives ingestion runs against one fetcher and one store.
pub struct Ingestor {
    fetcher: Fetcher,
    db: Database,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(fetcher: Fetcher, db: Database, config: IngestConfig) -> Self {
        Self { fetcher, db, config }
    }

    /// Execute one full ingestion run.
    pub async fn run(&mut self) -> Result<IngestReport, Error> {
        let mut report = IngestReport::new();

        let cities = self.fetch_cities().await?;
        report.cities = self.db.replace_cities(cities.clone()).await?;
        tracing::info!(cities = report.cities, "stored city table");

        self.db.recreate_restaurants().await?;

        for city in &cities {
            match search_businesses(&mut self.fetcher, &self.config.search, city).await {
                Ok(extraction) => {
                    if extraction.is_truncated() {
                        tracing::warn!(
                            rank = city.rank(),
                            city = city.name(),
                            returned = extraction.returned,
                            total = ?extraction.total,
                            "search results truncated to first page"
                        );
                        report.truncated_cities.push(city.name().to_string());
                    }

                    let skipped = extraction.skipped.len();
                    let outcome = self.db.insert_restaurants(extraction.businesses).await?;

                    report.records_skipped += skipped;
                    report.restaurants_inserted += outcome.inserted;
                    report.restaurants_ignored += outcome.ignored;

                    tracing::info!(
                        rank = city.rank(),
                        city = city.name(),
                        inserted = outcome.inserted,
                        ignored = outcome.ignored,
                        skipped,
                        "ingested city"
                    );
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(rank = city.rank(), city = city.name(), error = %e, "skipping city");
                    report.failures.push(CityFailure {
                        rank: city.rank(),
                        city: city.name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report.finished_at = Utc::now();
        tracing::info!(
            cities = report.cities,
            inserted = report.restaurants_inserted,
            failures = report.failures.len(),
            "ingestion run finished"
        );

        Ok(report)
    }

    async fn fetch_cities(&mut self) -> Result<Vec<City>, Error> {
        let html = self.fetcher.fetch_page(&self.config.wiki_url).await?;
        let cities = extract_cities(&html, self.config.city_count)?;

        for city in &cities {
            tracing::debug!(rank = city.rank(), city = city.name(), state = city.state(), "parsed city row");
            if !self.config.row_delay.is_zero() {
                tokio::time::sleep(self.config.row_delay).await;
            }
        }

        Ok(cities)
    }
}
