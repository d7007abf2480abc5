//! One full monitor tick: index reconcile -> per-locale scrape -> id
//! assignment -> trigger write (spec §2, §5).
//!
//! Fetches for every locale run concurrently with a bounded concurrency
//! limit; the id-assigner and trigger writer only run after every fetch
//! has completed, so they are never interleaved with the scrape phase.

use std::sync::Arc;

use crazyones_core::scrape;
use crazyones_models::{LocaleTag, Trigger};
use crazyones_store::{FingerprintLedgerStore, LocaleCatalogStore, LocaleStore, TriggerStore};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::error::Result;

const FETCH_CONCURRENCY: usize = 4;

pub struct TickConfig {
    pub data_dir: std::path::PathBuf,
    pub index_url: String,
}

#[derive(Debug, Default)]
pub struct TickOutcome {
    pub locales_considered: usize,
    pub locales_changed: usize,
    pub trigger_written: bool,
}

enum FetchResult {
    Unchanged,
    Changed { fingerprint: String, records: Vec<crazyones_models::SecurityUpdate> },
    Failed,
}

/// Runs one complete tick and returns a summary for logging and tests.
pub async fn run_tick(client: &reqwest::Client, config: &TickConfig) -> Result<TickOutcome> {
    let catalog_store = LocaleCatalogStore::new(&config.data_dir);
    let fingerprint_store = FingerprintLedgerStore::new(&config.data_dir);
    let locale_store = Arc::new(LocaleStore::new(&config.data_dir));
    let trigger_store = TriggerStore::new(&config.data_dir);

    let prior_catalog = catalog_store.load()?;
    let index_html = scrape::fetch(client, &config.index_url).await?;
    let reconciliation = crazyones_core::reconcile(&index_html, &prior_catalog);

    for locale in &reconciliation.removed {
        info!(locale = %locale, "locale removed from index; store retained read-only");
    }
    catalog_store.save(&reconciliation.catalog)?;

    let mut fingerprint_ledger = fingerprint_store.load()?;

    let locales: Vec<LocaleTag> = reconciliation.catalog.locales().cloned().collect();
    let client = client.clone();

    let results: Vec<(LocaleTag, String, FetchResult)> = stream::iter(locales.clone())
        .map(|locale| {
            let client = client.clone();
            let url = reconciliation.catalog.url(&locale).unwrap_or_default().to_string();
            let prior_fingerprint = fingerprint_ledger.get(&url).map(str::to_string);
            async move {
                let result = fetch_one(&client, &locale, &url, prior_fingerprint.as_deref()).await;
                (locale, url, result)
            }
        })
        .buffer_unordered(FETCH_CONCURRENCY)
        .collect()
        .await;

    let mut trigger = Trigger::new();
    let mut locales_changed = 0;

    for (locale, url, result) in results {
        match result {
            FetchResult::Unchanged => {}
            FetchResult::Failed => {
                warn!(locale = %locale, url = %url, "scrape failed, fingerprint left unchanged for retry");
            }
            FetchResult::Changed { fingerprint, records } => {
                locales_changed += 1;
                let novelty = locale_store.reconcile(&locale, records)?;
                fingerprint_ledger.set(url, fingerprint);
                if !novelty.is_empty() {
                    trigger.insert(locale, novelty);
                }
            }
        }
    }

    fingerprint_store.save(&fingerprint_ledger)?;

    let trigger_written = !trigger.is_empty();
    if trigger_written {
        trigger_store.write(&trigger)?;
    }

    Ok(TickOutcome {
        locales_considered: locales.len(),
        locales_changed,
        trigger_written,
    })
}

async fn fetch_one(
    client: &reqwest::Client,
    locale: &LocaleTag,
    url: &str,
    prior_fingerprint: Option<&str>,
) -> FetchResult {
    let body = match scrape::fetch(client, url).await {
        Ok(body) => body,
        Err(e) => {
            warn!(locale = %locale, url = %url, error = %e, "network error fetching locale page");
            return FetchResult::Failed;
        }
    };

    let fingerprint = scrape::fingerprint(&body);
    if Some(fingerprint.as_str()) == prior_fingerprint {
        return FetchResult::Unchanged;
    }

    match scrape::parse_table(locale, url, &body) {
        Ok(records) => FetchResult::Changed { fingerprint, records },
        Err(e) => {
            warn!(locale = %locale, url = %url, error = %e, "failed to parse releases table");
            FetchResult::Failed
        }
    }
}
