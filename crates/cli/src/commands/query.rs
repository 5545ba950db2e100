//! `forkmap query`: column selection with equality filters, tab-separated.

use anyhow::{Context, Result, bail};

use forkmap_core::db::display_value;
use forkmap_core::{AppConfig, Column, Database};

pub async fn run(config: &AppConfig, columns: &[String], filters: &[String]) -> Result<()> {
    let columns = columns.iter().map(|c| c.parse::<Column>()).collect::<Result<Vec<_>, _>>()?;
    let filters = parse_filters(filters)?;

    let db = Database::open(&config.db_path)
        .await
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    let rows = db.query_restaurants(&columns, &filters).await?;

    let header: Vec<_> = columns.iter().map(Column::as_str).collect();
    println!("{}", header.join("\t"));
    for row in rows {
        let cells: Vec<_> = row.iter().map(display_value).collect();
        println!("{}", cells.join("\t"));
    }

    Ok(())
}

fn parse_filters(filters: &[String]) -> Result<Vec<(Column, String)>> {
    filters
        .iter()
        .map(|filter| {
            let Some((column, value)) = filter.split_once('=') else {
                bail!("filter '{filter}' must look like COLUMN=VALUE");
            };
            Ok((column.parse::<Column>()?, value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filters() {
        let parsed = parse_filters(&["cityid=3".into(), "name=Joe's = Best".into()]).unwrap();
        assert_eq!(parsed, vec![(Column::CityId, "3".to_string()), (Column::Name, "Joe's = Best".to_string())]);
    }

    #[test]
    fn test_parse_filters_rejects_malformed() {
        assert!(parse_filters(&["rating".into()]).is_err());
        assert!(parse_filters(&["owner=me".into()]).is_err());
    }
}
