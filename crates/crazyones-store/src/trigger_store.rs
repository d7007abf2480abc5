//! Persistence for the transient trigger document
//! (`new_updates_trigger.json`).

use std::path::PathBuf;

use crazyones_models::Trigger;
use tracing::debug;

use crate::atomic::{atomic_write_json, read_json_lenient};
use crate::error::Result;

/// Single-producer (monitor), single-consumer (bot) handoff file.
pub struct TriggerStore {
    path: PathBuf,
}

impl TriggerStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join("new_updates_trigger.json"),
        }
    }

    /// Writes the trigger document. Callers must only call this when
    /// `trigger` is non-empty (spec §4.4); an empty trigger is simply
    /// not written at all.
    pub fn write(&self, trigger: &Trigger) -> Result<()> {
        atomic_write_json(&self.path, trigger)
    }

    /// Reads and deletes the trigger document if present and valid.
    ///
    /// A missing file returns `None`. A file that fails to parse (a
    /// concurrent partial write from the monitor) also returns `None`
    /// rather than an error — the bot treats this as "not ready yet,
    /// retry next tick" per spec §5, and deliberately does *not* delete
    /// the file in that case so the monitor's rename can complete.
    pub fn take(&self) -> Option<Trigger> {
        let trigger: Trigger = read_json_lenient(&self.path)?;
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!(error = %e, "failed to delete trigger document after reading it");
        }
        Some(trigger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crazyones_models::LocaleTag;
    use std::collections::BTreeSet;
    use std::str::FromStr;
    use tempfile::tempdir;

    #[test]
    fn take_on_missing_file_returns_none() {
        let dir = tempdir().unwrap();
        let store = TriggerStore::new(dir.path());
        assert!(store.take().is_none());
    }

    #[test]
    fn write_then_take_deletes_the_file() {
        let dir = tempdir().unwrap();
        let store = TriggerStore::new(dir.path());

        let mut trigger = Trigger::new();
        trigger.insert(LocaleTag::from_str("en-us").unwrap(), BTreeSet::from([6]));
        store.write(&trigger).unwrap();

        let taken = store.take().unwrap();
        assert_eq!(taken, trigger);
        assert!(store.take().is_none());
    }

    #[test]
    fn take_on_corrupt_file_returns_none_and_does_not_delete() {
        let dir = tempdir().unwrap();
        let store = TriggerStore::new(dir.path());
        std::fs::write(&store.path, b"{not valid json").unwrap();

        assert!(store.take().is_none());
        assert!(store.path.exists());
    }
}
