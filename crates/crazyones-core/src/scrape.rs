//! Per-locale page fetch, table scrape, and fingerprinting (spec §4.2).
//!
//! Two-stage change detection: the page body is hashed first, and the
//! (expensive, per-row) table parse only runs when the hash differs from
//! the locale's last recorded fingerprint.

use crazyones_models::{LocaleTag, SecurityUpdate};
use scraper::{Html, Selector};
use sha2::{Digest, Sha256};

use crate::date_grammar;
use crate::error::{CoreError, Result};

/// Fetches `url` with `client`, returning the raw response body.
pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| CoreError::Network { url: url.to_string(), source })?;
    let response = response
        .error_for_status()
        .map_err(|source| CoreError::Network { url: url.to_string(), source })?;
    response
        .text()
        .await
        .map_err(|source| CoreError::Network { url: url.to_string(), source })
}

/// Computes the SHA-256 fingerprint of a page body, hex-encoded.
///
/// This is the stage-one change signal: unchanged bodies never reach the
/// table parser, so a tick over an untouched locale costs one hash.
pub fn fingerprint(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

/// Parses the releases table out of a locale page's HTML.
///
/// Expected shape: a `<table>` whose body rows carry the update name (an
/// anchor's text, optionally with an `href` to the article), the affected
/// target, and a rendered date string, each in its own `<td>`. Ids are
/// left at `0`; the caller (the locale store's reconcile pass) assigns
/// the stable id.
///
/// A page can carry more than one `<table>` (navigation widgets, "related
/// articles" boxes, ...), so the releases table is located first: among
/// every `<table>` on the page, the one with the most rows whose first
/// `<td>` contains an `<a href>` is taken to be it, per spec.md's stated
/// disambiguation signal. Only that table's rows are then scraped.
///
/// Returns [`CoreError::ParseFailure`] when no table has any row matching
/// that signal, or the matched table yields no complete row, so the
/// caller can skip updating the fingerprint and retry the parse on the
/// next tick.
pub fn parse_table(locale: &LocaleTag, url: &str, html: &str) -> Result<Vec<SecurityUpdate>> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();
    let link_selector = Selector::parse("a").unwrap();

    let releases_table = document
        .select(&table_selector)
        .map(|table| {
            let score = table
                .select(&row_selector)
                .filter(|row| {
                    let cells: Vec<_> = row.select(&cell_selector).collect();
                    cells.first().is_some_and(|first| first.select(&link_selector).next().is_some())
                })
                .count();
            (table, score)
        })
        .filter(|(_, score)| *score > 0)
        .max_by_key(|(_, score)| *score)
        .map(|(table, _)| table);

    let mut updates = Vec::new();

    if let Some(table) = releases_table {
        for row in table.select(&row_selector) {
            let cells: Vec<_> = row.select(&cell_selector).collect();
            if cells.len() < 3 {
                continue;
            }

            let name_cell = cells[0];
            let name = name_cell.text().collect::<String>().trim().to_string();
            if name.is_empty() {
                continue;
            }
            let href = name_cell
                .select(&link_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string);

            let target = cells[1].text().collect::<String>().trim().to_string();
            let raw_date = cells[2].text().collect::<String>().trim().to_string();
            let date = date_grammar::parse(locale, &raw_date);

            updates.push(SecurityUpdate {
                id: 0,
                name,
                url: href,
                target,
                date,
            });
        }
    }

    if updates.is_empty() {
        return Err(CoreError::ParseFailure {
            locale: locale.as_str().to_string(),
            url: url.to_string(),
        });
    }

    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn locale(tag: &str) -> LocaleTag {
        LocaleTag::from_str(tag).unwrap()
    }

    const PAGE: &str = r#"
        <table>
          <tr><th>Name</th><th>Target</th><th>Date</th></tr>
          <tr>
            <td><a href="https://support.apple.com/en-us/HT213841">iOS 17.5 and iPadOS 17.5</a></td>
            <td>iPhone XS and later</td>
            <td>13 May 2024</td>
          </tr>
          <tr>
            <td>macOS Sonoma 14.5</td>
            <td>macOS Sonoma</td>
            <td>not a date</td>
          </tr>
        </table>
    "#;

    #[test]
    fn parses_rows_with_and_without_links() {
        let updates = parse_table(&locale("en-us"), "https://support.apple.com/en-us/100100", PAGE).unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].name, "iOS 17.5 and iPadOS 17.5");
        assert_eq!(updates[0].url.as_deref(), Some("https://support.apple.com/en-us/HT213841"));
        assert_eq!(updates[0].date, "2024-05-13");
        assert_eq!(updates[1].url, None);
        assert_eq!(updates[1].date, crazyones_models::SENTINEL_DATE);
    }

    #[test]
    fn unrelated_table_with_enough_columns_is_not_mistaken_for_the_releases_table() {
        const PAGE_WITH_DECOY: &str = r#"
            <table>
              <tr><th>Region</th><th>Language</th><th>Code</th></tr>
              <tr><td>United States</td><td>English</td><td>en-us</td></tr>
              <tr><td>France</td><td>French</td><td>fr-fr</td></tr>
            </table>
            <table>
              <tr><th>Name</th><th>Target</th><th>Date</th></tr>
              <tr>
                <td><a href="https://support.apple.com/en-us/HT213841">iOS 17.5 and iPadOS 17.5</a></td>
                <td>iPhone XS and later</td>
                <td>13 May 2024</td>
              </tr>
            </table>
        "#;

        let updates = parse_table(&locale("en-us"), "https://support.apple.com/en-us/100100", PAGE_WITH_DECOY).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].name, "iOS 17.5 and iPadOS 17.5");
    }

    #[test]
    fn empty_table_is_a_parse_failure() {
        let result = parse_table(&locale("en-us"), "https://support.apple.com/en-us/100100", "<table></table>");
        assert!(matches!(result, Err(CoreError::ParseFailure { .. })));
    }

    #[test]
    fn fingerprint_is_stable_and_sensitive_to_changes() {
        let a = fingerprint(PAGE);
        let b = fingerprint(PAGE);
        let c = fingerprint("different body");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
