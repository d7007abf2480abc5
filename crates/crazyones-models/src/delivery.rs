//! The per-subscriber delivery ledger.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::locale::LocaleTag;

/// Set of `(subscriber, locale, update-id)` tuples already delivered,
/// keyed by chat id then locale for the on-disk shape
/// `{chat_id: {locale: [id, ...]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryLedger(BTreeMap<i64, BTreeMap<LocaleTag, BTreeSet<u32>>>);

impl DeliveryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ids already delivered to `chat_id` for `locale`.
    pub fn delivered(&self, chat_id: i64, locale: &LocaleTag) -> BTreeSet<u32> {
        self.0
            .get(&chat_id)
            .and_then(|by_locale| by_locale.get(locale))
            .cloned()
            .unwrap_or_default()
    }

    /// Records that `id` was delivered to `chat_id` for `locale`.
    pub fn record(&mut self, chat_id: i64, locale: LocaleTag, id: u32) {
        self.0
            .entry(chat_id)
            .or_default()
            .entry(locale)
            .or_default()
            .insert(id);
    }

    pub fn is_delivered(&self, chat_id: i64, locale: &LocaleTag, id: u32) -> bool {
        self.0
            .get(&chat_id)
            .and_then(|by_locale| by_locale.get(locale))
            .is_some_and(|ids| ids.contains(&id))
    }
}
