//! Ranked city extraction from the population list page.
//!
//! The page carries one `wikitable sortable` table whose first row is a
//! header. Each data row holds the city link in the second cell, the state in
//! the third and a combined decimal "lat lon" span in the last.

use scraper::{ElementRef, Html, Selector};

use forkmap_core::{City, Error};

/// Parse the first `count` data rows of the ranked city table.
///
/// Rank is the 1-based row position after the header. Latitude and longitude
/// both take the first two characters of the first token of the row's
/// `span.geo-dec`.
///
/// # Errors
///
/// Returns `Error::Parse` if the table is missing, has fewer than `count`
/// data rows, or any of those rows lacks a name link, state or geo span.
pub fn extract_cities(html: &str, count: usize) -> Result<Vec<City>, Error> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table.wikitable.sortable").expect("invalid selector");
    let row_selector = Selector::parse("tr").expect("invalid selector");

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| Error::Parse("no sortable wikitable on the city list page".into()))?;

    let rows: Vec<ElementRef<'_>> = table.select(&row_selector).collect();
    let data_rows = rows.len().saturating_sub(1);
    if data_rows < count {
        return Err(Error::Parse(format!(
            "city table has {data_rows} data rows, expected at least {count}"
        )));
    }

    let cities = rows
        .iter()
        .skip(1)
        .take(count)
        .enumerate()
        .map(|(i, row)| parse_row(*row, i as u32 + 1))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(cities = cities.len(), "parsed city table");

    Ok(cities)
}

fn parse_row(row: ElementRef<'_>, rank: u32) -> Result<City, Error> {
    let cell_selector = Selector::parse("td").expect("invalid selector");
    let link_selector = Selector::parse("a").expect("invalid selector");
    let geo_selector = Selector::parse("span.geo-dec").expect("invalid selector");

    let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
    if cells.len() < 3 {
        return Err(Error::Parse(format!("city row {rank} has {} cells, expected at least 3", cells.len())));
    }

    let name = cells[1]
        .select(&link_selector)
        .next()
        .map(text_of)
        .ok_or_else(|| Error::Parse(format!("city row {rank} has no linked name")))?;

    let state = match cells[2].select(&link_selector).next() {
        Some(link) => text_of(link),
        None => strip_wrapping(&cells[2].text().collect::<String>()),
    };

    let geo = cells[cells.len() - 1]
        .select(&geo_selector)
        .next()
        .map(text_of)
        .ok_or_else(|| Error::Parse(format!("city row {rank} has no geo-dec span")))?;
    let coordinate = truncated_coordinate(&geo)
        .ok_or_else(|| Error::Parse(format!("city row {rank} has unusable coordinates '{geo}'")))?;

    City::new(rank, name, state, coordinate, coordinate)
        .map_err(|e| Error::Parse(format!("city row {rank}: {e}")))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Drop the first and last character of an unlinked state cell's raw text,
/// which the page wraps in brackets or line breaks.
fn strip_wrapping(raw: &str) -> String {
    let mut chars = raw.chars();
    chars.next();
    chars.next_back();
    chars.as_str().trim().to_string()
}

/// First two characters of the first whitespace-separated token.
fn truncated_coordinate(geo: &str) -> Option<f64> {
    let token = geo.split_whitespace().next()?;
    let head: String = token.chars().take(2).collect();
    head.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, state_cell: &str, geo: &str) -> String {
        format!(
            r#"<tr><td>1</td><td><a href="/wiki/{name}">{name}</a></td><td>{state_cell}</td>
               <td>1,000</td><td><span class="geo-dec">{geo}</span></td></tr>"#
        )
    }

    fn page(rows: &[String]) -> String {
        format!(
            r#"<html><body>
               <table class="wikitable"><tr><td>decoy</td></tr></table>
               <table class="wikitable sortable">
               <tr><th>Rank</th><th>City</th><th>State</th><th>Population</th><th>Location</th></tr>
               {}
               </table></body></html>"#,
            rows.join("\n")
        )
    }

    fn numbered(n: usize) -> Vec<String> {
        (1..=n)
            .map(|i| row(&format!("City{i}"), r#"<a href="/wiki/S">State</a>"#, "40.71°N 74.00°W"))
            .collect()
    }

    #[test]
    fn test_extract_exactly_count_in_order() {
        let html = page(&numbered(105));
        let cities = extract_cities(&html, 100).unwrap();

        assert_eq!(cities.len(), 100);
        for (i, city) in cities.iter().enumerate() {
            assert_eq!(city.rank(), i as u32 + 1);
            assert_eq!(city.name(), format!("City{}", i + 1));
        }
    }

    #[test]
    fn test_extract_exact_row_count_is_enough() {
        let html = page(&numbered(3));
        assert_eq!(extract_cities(&html, 3).unwrap().len(), 3);
    }

    #[test]
    fn test_too_few_rows_is_parse_error() {
        let html = page(&numbered(99));
        let err = extract_cities(&html, 100).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("99 data rows"));
    }

    #[test]
    fn test_missing_table_is_parse_error() {
        let html = r#"<html><body><table class="wikitable"><tr><td>x</td></tr></table></body></html>"#;
        assert!(matches!(extract_cities(html, 1), Err(Error::Parse(_))));
    }

    #[test]
    fn test_state_prefers_link_then_strips_wrapping() {
        let html = page(&[
            row("Springfield", r#"<a href="/wiki/Illinois">Illinois</a>"#, "39.78 -89.65"),
            row("Columbus", "[Ohio]", "39.96 -83.00"),
        ]);
        let cities = extract_cities(&html, 2).unwrap();

        assert_eq!(cities[0].state(), "Illinois");
        assert_eq!(cities[1].state(), "Ohio");
    }

    #[test]
    fn test_geo_truncated_to_two_chars_for_both_axes() {
        let html = page(&[row("Troy", "<a>New York</a>", "42.7284°N 73.6918°W")]);
        let cities = extract_cities(&html, 1).unwrap();

        assert_eq!(cities[0].latitude(), 42.0);
        assert_eq!(cities[0].longitude(), 42.0);
    }

    #[test]
    fn test_missing_geo_is_parse_error() {
        let html = page(&[r#"<tr><td>1</td><td><a>Troy</a></td><td><a>NY</a></td><td>n/a</td></tr>"#.to_string()]);
        assert!(matches!(extract_cities(&html, 1), Err(Error::Parse(_))));
    }

    #[test]
    fn test_strip_wrapping() {
        assert_eq!(strip_wrapping("(Texas)"), "Texas");
        assert_eq!(strip_wrapping("\nTexas\n"), "Texas");
        assert_eq!(strip_wrapping("x"), "");
        assert_eq!(strip_wrapping(""), "");
    }

    #[test]
    fn test_truncated_coordinate() {
        assert_eq!(truncated_coordinate("40.71 -74.00"), Some(40.0));
        assert_eq!(truncated_coordinate("-7.5 3"), Some(-7.0));
        assert_eq!(truncated_coordinate("N/A"), None);
        assert_eq!(truncated_coordinate(""), None);
    }
}
