//! Locale-index reconciler (spec §4.1).
//!
//! Parses the canonical locale index page and classifies every locale
//! against the prior catalog. Pure function of (new HTML, prior
//! catalog): calling it twice on identical input yields identical output,
//! satisfying the idempotence requirement in spec §4.1.

use std::str::FromStr;

use crazyones_models::{LocaleCatalog, LocaleTag};
use scraper::{Html, Selector};
use tracing::warn;

/// The four-way classification of every locale observed this run against
/// the prior catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub catalog: LocaleCatalog,
    pub added: Vec<LocaleTag>,
    pub removed: Vec<LocaleTag>,
    pub updated: Vec<LocaleTag>,
    pub unchanged: Vec<LocaleTag>,
}

/// Parses `html` (the canonical locale index page) and reconciles it
/// against `prior`.
///
/// Duplicate locale tags in the document: last occurrence wins, and every
/// overwrite is logged at `warn` per spec §4.1's tie-break rule.
pub fn reconcile(html: &str, prior: &LocaleCatalog) -> Reconciliation {
    let document = Html::parse_document(html);

    // `<link rel="alternate" hreflang="xx-yy" href="...">` gives us the
    // locale -> URL mapping; this is the standard hreflang pattern and
    // matches spec §4.1's "alternate-locale link" language directly.
    let alternate_selector = Selector::parse(r#"link[rel="alternate"][hreflang]"#).unwrap();
    // The human-readable display name is not carried by `<link>` tags
    // (they're empty head elements), so it is read from the visible
    // language-switcher anchors that share the same `hreflang` attribute.
    let anchor_selector = Selector::parse("a[hreflang]").unwrap();

    let mut fresh = LocaleCatalog::default();

    for link in document.select(&alternate_selector) {
        let Some(hreflang) = link.value().attr("hreflang") else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Ok(locale) = LocaleTag::from_str(hreflang) else {
            warn!(tag = %hreflang, "skipping locale index entry with malformed locale tag");
            continue;
        };

        if let Some(prior_url) = fresh.url(&locale) {
            if prior_url != href {
                warn!(locale = %locale, old_url = %prior_url, new_url = %href, "duplicate locale in index, last occurrence wins");
            }
        }

        let name = fresh.name(&locale).map(str::to_string);
        fresh.insert(locale, href.to_string(), name.unwrap_or_default());
    }

    for anchor in document.select(&anchor_selector) {
        let Some(hreflang) = anchor.value().attr("hreflang") else {
            continue;
        };
        let Ok(locale) = LocaleTag::from_str(hreflang) else {
            continue;
        };
        if !fresh.contains(&locale) {
            continue;
        }
        let text = anchor.text().collect::<String>().trim().to_string();
        if !text.is_empty() {
            let url = fresh.url(&locale).unwrap_or_default().to_string();
            fresh.insert(locale, url, text);
        }
    }

    // Locales with no display name fall back to the tag itself so every
    // catalog entry always has a presentable name.
    let locales_without_names: Vec<LocaleTag> = fresh
        .locales()
        .filter(|l| fresh.name(l).unwrap_or_default().is_empty())
        .cloned()
        .collect();
    for locale in locales_without_names {
        let url = fresh.url(&locale).unwrap_or_default().to_string();
        let name = locale.as_str().to_string();
        fresh.insert(locale, url, name);
    }

    let mut added = Vec::new();
    let mut updated = Vec::new();
    let mut unchanged = Vec::new();

    for locale in fresh.locales() {
        match prior.url(locale) {
            None => added.push(locale.clone()),
            Some(prior_url) if prior_url != fresh.url(locale).unwrap() => updated.push(locale.clone()),
            Some(_) => unchanged.push(locale.clone()),
        }
    }

    let removed: Vec<LocaleTag> = prior
        .locales()
        .filter(|l| !fresh.contains(l))
        .cloned()
        .collect();

    Reconciliation {
        catalog: fresh,
        added,
        removed,
        updated,
        unchanged,
    }
}
