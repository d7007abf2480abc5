//! Persistence for the fingerprint ledger (`updates_tracking.json`).

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::atomic::{atomic_write_json, read_json_optional};
use crate::error::Result;

/// Maps each locale URL to the SHA-256 hex digest of its last-processed
/// page body. Mutated only by the monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FingerprintLedger(BTreeMap<String, String>);

impl FingerprintLedger {
    pub fn get(&self, url: &str) -> Option<&str> {
        self.0.get(url).map(String::as_str)
    }

    pub fn set(&mut self, url: String, digest: String) {
        self.0.insert(url, digest);
    }

    pub fn remove(&mut self, url: &str) {
        self.0.remove(url);
    }
}

pub struct FingerprintLedgerStore {
    path: PathBuf,
}

impl FingerprintLedgerStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join("updates_tracking.json"),
        }
    }

    pub fn load(&self) -> Result<FingerprintLedger> {
        let map: BTreeMap<String, String> = read_json_optional(&self.path)?.unwrap_or_default();
        Ok(FingerprintLedger(map))
    }

    pub fn save(&self, ledger: &FingerprintLedger) -> Result<()> {
        atomic_write_json(&self.path, &ledger.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = FingerprintLedgerStore::new(dir.path());

        let mut ledger = store.load().unwrap();
        assert!(ledger.get("https://example.com/en-us").is_none());

        ledger.set("https://example.com/en-us".into(), "abc123".into());
        store.save(&ledger).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.get("https://example.com/en-us"), Some("abc123"));
    }
}
