//! Read-only views over the stored tables: `cities`, `top` and `detail`.

use anyhow::{Context, Result};

use forkmap_core::{AppConfig, Database, RestaurantRow};

async fn open(config: &AppConfig) -> Result<Database> {
    Database::open(&config.db_path)
        .await
        .with_context(|| format!("opening {}", config.db_path.display()))
}

pub async fn cities(config: &AppConfig) -> Result<()> {
    let db = open(config).await?;
    let cities = db.list_cities().await?;

    if cities.is_empty() {
        println!("no cities stored yet, run `forkmap ingest` first");
        return Ok(());
    }

    for city in cities {
        println!(
            "{:>3}  {}, {}  ({}, {})",
            city.rank(),
            city.name(),
            city.state(),
            city.latitude(),
            city.longitude()
        );
    }

    Ok(())
}

pub async fn top(config: &AppConfig, city: &str, limit: Option<usize>) -> Result<()> {
    let db = open(config).await?;

    let Some(stored) = db.find_city(city).await? else {
        println!("no stored city named '{city}'");
        return Ok(());
    };

    let ranked = db.ranked_for_city(stored.name(), limit).await?;
    if ranked.is_empty() {
        println!("no restaurants stored for {}", stored.name());
        return Ok(());
    }

    println!("#{} {}, {}", stored.rank(), stored.name(), stored.state());
    for entry in ranked {
        let row = &entry.row;
        println!(
            "{:>3}. {}  {} ({} reviews)  {}",
            entry.position,
            row.name,
            optional(row.rating),
            optional(row.review_count),
            row.category.as_deref().unwrap_or("")
        );
    }

    Ok(())
}

pub async fn detail(config: &AppConfig, city: &str, name: &str) -> Result<()> {
    let db = open(config).await?;
    let rows = db.restaurant_detail(city, name).await?;

    if rows.is_empty() {
        println!("no restaurant named '{name}' in {city}");
        return Ok(());
    }

    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_detail(row);
    }

    Ok(())
}

fn print_detail(row: &RestaurantRow) {
    println!("name:         {}", row.name);
    println!("id:           {}", row.id);
    println!("category:     {}", row.category.as_deref().unwrap_or(""));
    println!("rating:       {}", optional(row.rating));
    println!("reviews:      {}", optional(row.review_count));
    println!("phone:        {}", row.phone.as_deref().unwrap_or(""));
    println!("coordinates:  [{}, {}]", optional(row.latitude), optional(row.longitude));
    println!(
        "location:     {}, {} {}",
        row.city.as_deref().unwrap_or(""),
        row.state.as_deref().unwrap_or(""),
        row.zip_code.as_deref().unwrap_or("")
    );
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
