//! Locale identifiers and the locale catalog.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A `xx-yy` locale tag: a 2-3 letter lowercase language subtag and a
/// 2 letter lowercase region subtag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleTag(String);

/// Error returned when a string does not look like a locale tag.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid locale tag: {0:?}")]
pub struct LocaleError(pub String);

impl LocaleTag {
    /// Returns the tag as a plain string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(s: &str) -> bool {
        let Some((lang, region)) = s.split_once('-') else {
            return false;
        };
        let lang_ok = (2..=3).contains(&lang.len()) && lang.bytes().all(|b| b.is_ascii_lowercase());
        let region_ok = region.len() == 2 && region.bytes().all(|b| b.is_ascii_lowercase());
        lang_ok && region_ok
    }
}

impl FromStr for LocaleTag {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(LocaleError(s.to_string()))
        }
    }
}

impl fmt::Display for LocaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LocaleTag {
    type Error = LocaleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(LocaleError(s))
        }
    }
}

/// The reconciled mapping from locale to canonical URL, plus the
/// locale's human-readable display name.
///
/// Stored on disk as two sibling files (`language_urls.json` and
/// `language_names.json`); kept as one struct in memory so callers never
/// need to keep the two maps in sync themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleCatalog {
    urls: BTreeMap<LocaleTag, String>,
    names: BTreeMap<LocaleTag, String>,
}

impl LocaleCatalog {
    /// Builds a catalog from its two persisted maps.
    pub fn from_parts(urls: BTreeMap<LocaleTag, String>, names: BTreeMap<LocaleTag, String>) -> Self {
        Self { urls, names }
    }

    /// Splits the catalog back into its two persisted maps.
    pub fn into_parts(self) -> (BTreeMap<LocaleTag, String>, BTreeMap<LocaleTag, String>) {
        (self.urls, self.names)
    }

    /// Returns the URL map.
    pub fn urls(&self) -> &BTreeMap<LocaleTag, String> {
        &self.urls
    }

    /// Returns the display-name map.
    pub fn names(&self) -> &BTreeMap<LocaleTag, String> {
        &self.names
    }

    /// Returns whether a locale exists in the catalog.
    pub fn contains(&self, locale: &LocaleTag) -> bool {
        self.urls.contains_key(locale)
    }

    /// Returns the URL for a locale, if known.
    pub fn url(&self, locale: &LocaleTag) -> Option<&str> {
        self.urls.get(locale).map(String::as_str)
    }

    /// Returns the display name for a locale, if known.
    pub fn name(&self, locale: &LocaleTag) -> Option<&str> {
        self.names.get(locale).map(String::as_str)
    }

    /// Inserts or replaces a locale's URL and display name.
    pub fn insert(&mut self, locale: LocaleTag, url: String, name: String) {
        self.urls.insert(locale.clone(), url);
        self.names.insert(locale, name);
    }

    /// Removes a locale from the catalog.
    pub fn remove(&mut self, locale: &LocaleTag) {
        self.urls.remove(locale);
        self.names.remove(locale);
    }

    /// Iterates over every known locale tag.
    pub fn locales(&self) -> impl Iterator<Item = &LocaleTag> {
        self.urls.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }
}
