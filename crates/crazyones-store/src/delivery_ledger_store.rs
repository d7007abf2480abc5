//! Persistence for the delivery ledger (`delivery_ledger.json`).

use std::path::PathBuf;

use crazyones_models::{DeliveryLedger, LocaleTag};

use crate::atomic::{atomic_write_json, read_json_optional};
use crate::error::Result;

/// Append-only record of updates already delivered per subscriber.
/// Exclusively written by the bot.
pub struct DeliveryLedgerStore {
    path: PathBuf,
}

impl DeliveryLedgerStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join("delivery_ledger.json"),
        }
    }

    pub fn load(&self) -> Result<DeliveryLedger> {
        Ok(read_json_optional(&self.path)?.unwrap_or_default())
    }

    /// Appends a single delivery and flushes immediately, so a crash
    /// between an individual send and this call is the only window in
    /// which at-most-once delivery is not guaranteed (spec §4.8 step 5).
    pub fn record_and_flush(&self, chat_id: i64, locale: LocaleTag, id: u32) -> Result<()> {
        let mut ledger = self.load()?;
        ledger.record(chat_id, locale, id);
        atomic_write_json(&self.path, &ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tempfile::tempdir;

    #[test]
    fn record_and_flush_persists_immediately() {
        let dir = tempdir().unwrap();
        let store = DeliveryLedgerStore::new(dir.path());
        let en = LocaleTag::from_str("en-us").unwrap();

        store.record_and_flush(1, en.clone(), 6).unwrap();

        let reloaded = DeliveryLedgerStore::new(dir.path()).load().unwrap();
        assert!(reloaded.is_delivered(1, &en, 6));
    }

    #[test]
    fn consuming_the_same_delivery_twice_does_not_duplicate() {
        let dir = tempdir().unwrap();
        let store = DeliveryLedgerStore::new(dir.path());
        let en = LocaleTag::from_str("en-us").unwrap();

        store.record_and_flush(1, en.clone(), 6).unwrap();
        store.record_and_flush(1, en.clone(), 6).unwrap();

        let ledger = store.load().unwrap();
        assert_eq!(ledger.delivered(1, &en).len(), 1);
    }
}
