//! Per-locale date grammars.
//!
//! Converts the human-readable date string as rendered on a locale's
//! releases page into ISO 8601 (`YYYY-MM-DD`). Unknown formats fall
//! through to the sentinel date (spec §6/§7); this is a parser, never a
//! source of errors.

use chrono::NaiveDate;
use crazyones_models::{LocaleTag, SENTINEL_DATE};

/// Parses `raw` using the date grammar for `locale`'s language subtag,
/// falling back to the sentinel date when the grammar is unrecognized or
/// the string doesn't match it.
pub fn parse(locale: &LocaleTag, raw: &str) -> String {
    let raw = raw.trim();
    let lang = locale.as_str().split('-').next().unwrap_or("");

    let parsed = match lang {
        "en" => parse_english(raw),
        "es" => parse_spanish(raw),
        "fr" => parse_french(raw),
        "de" => parse_german(raw),
        "ja" | "zh" => parse_cjk(raw),
        _ => None,
    };

    parsed.unwrap_or_else(|| SENTINEL_DATE.to_string())
}

fn to_iso(year: i32, month: u32, day: u32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

fn month_index(name: &str, table: &[&str]) -> Option<u32> {
    let name = name.to_lowercase();
    table
        .iter()
        .position(|m| m.eq_ignore_ascii_case(&name))
        .map(|i| i as u32 + 1)
}

const EN_MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september", "october", "november",
    "december",
];

const ES_MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

const FR_MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

const DE_MONTHS: [&str; 12] = [
    "januar",
    "februar",
    "märz",
    "april",
    "mai",
    "juni",
    "juli",
    "august",
    "september",
    "oktober",
    "november",
    "dezember",
];

/// "22 January 2024" or "January 22, 2024".
fn parse_english(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw.split_whitespace().collect();
    if words.len() != 3 {
        return None;
    }

    if let (Ok(day), Some(month), Ok(year)) = (
        words[0].parse::<u32>(),
        month_index(words[1], &EN_MONTHS),
        words[2].parse::<i32>(),
    ) {
        return to_iso(year, month, day);
    }

    let day_str = words[1].trim_end_matches(',');
    if let (Some(month), Ok(day), Ok(year)) = (
        month_index(words[0], &EN_MONTHS),
        day_str.parse::<u32>(),
        words[2].parse::<i32>(),
    ) {
        return to_iso(year, month, day);
    }

    None
}

/// "22 de enero de 2024".
fn parse_spanish(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw.split_whitespace().collect();
    if words.len() != 5 || !words[1].eq_ignore_ascii_case("de") || !words[3].eq_ignore_ascii_case("de") {
        return None;
    }
    let day = words[0].parse::<u32>().ok()?;
    let month = month_index(words[2], &ES_MONTHS)?;
    let year = words[4].parse::<i32>().ok()?;
    to_iso(year, month, day)
}

/// "22 janvier 2024" (and "1er janvier 2024" for the first of the month).
fn parse_french(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw.split_whitespace().collect();
    if words.len() != 3 {
        return None;
    }
    let day_str = words[0].trim_end_matches("er");
    let day = day_str.parse::<u32>().ok()?;
    let month = month_index(words[1], &FR_MONTHS)?;
    let year = words[2].parse::<i32>().ok()?;
    to_iso(year, month, day)
}

/// "22. Januar 2024".
fn parse_german(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw.split_whitespace().collect();
    if words.len() != 3 {
        return None;
    }
    let day_str = words[0].trim_end_matches('.');
    let day = day_str.parse::<u32>().ok()?;
    let month = month_index(words[1], &DE_MONTHS)?;
    let year = words[2].parse::<i32>().ok()?;
    to_iso(year, month, day)
}

/// "2024年1月22日" (shared by Japanese and Chinese renderings).
fn parse_cjk(raw: &str) -> Option<String> {
    let (year_part, rest) = raw.split_once('年')?;
    let (month_part, rest) = rest.split_once('月')?;
    let (day_part, _) = rest.split_once('日')?;

    let year = year_part.trim().parse::<i32>().ok()?;
    let month = month_part.trim().parse::<u32>().ok()?;
    let day = day_part.trim().parse::<u32>().ok()?;
    to_iso(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn locale(tag: &str) -> LocaleTag {
        LocaleTag::from_str(tag).unwrap()
    }

    #[test]
    fn parses_english_day_month_year() {
        assert_eq!(parse(&locale("en-us"), "22 January 2024"), "2024-01-22");
    }

    #[test]
    fn parses_english_month_day_year() {
        assert_eq!(parse(&locale("en-us"), "January 22, 2024"), "2024-01-22");
    }

    #[test]
    fn parses_spanish() {
        assert_eq!(parse(&locale("es-es"), "22 de enero de 2024"), "2024-01-22");
    }

    #[test]
    fn parses_french_including_premier() {
        assert_eq!(parse(&locale("fr-fr"), "22 janvier 2024"), "2024-01-22");
        assert_eq!(parse(&locale("fr-fr"), "1er janvier 2024"), "2024-01-01");
    }

    #[test]
    fn parses_german() {
        assert_eq!(parse(&locale("de-de"), "22. Januar 2024"), "2024-01-22");
    }

    #[test]
    fn parses_japanese_and_chinese() {
        assert_eq!(parse(&locale("ja-jp"), "2024年1月22日"), "2024-01-22");
        assert_eq!(parse(&locale("zh-cn"), "2024年1月22日"), "2024-01-22");
    }

    #[test]
    fn unknown_format_falls_through_to_sentinel() {
        assert_eq!(parse(&locale("en-us"), "not a date"), SENTINEL_DATE);
        assert_eq!(parse(&locale("ko-kr"), "2024년 1월 22일"), SENTINEL_DATE);
    }
}
