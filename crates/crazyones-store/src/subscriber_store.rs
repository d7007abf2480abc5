//! Persistence for the subscriber list (`subscribers.json`).

use std::path::PathBuf;

use crazyones_models::{LocaleTag, Subscriber};

use crate::atomic::{atomic_write_json, read_json_optional};
use crate::error::Result;

/// Manages the subscriber list. Exclusively written by the bot.
pub struct SubscriberStore {
    path: PathBuf,
}

impl SubscriberStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join("subscribers.json"),
        }
    }

    pub fn load(&self) -> Result<Vec<Subscriber>> {
        Ok(read_json_optional(&self.path)?.unwrap_or_default())
    }

    fn save(&self, subscribers: &[Subscriber]) -> Result<()> {
        atomic_write_json(&self.path, subscribers)
    }

    /// Creates a new subscriber, or reactivates and updates the locale
    /// of an existing one for this chat id.
    pub fn upsert(&self, chat_id: i64, locale: LocaleTag) -> Result<Subscriber> {
        let mut subscribers = self.load()?;
        let subscriber = if let Some(existing) = subscribers.iter_mut().find(|s| s.chat_id == chat_id) {
            existing.reactivate();
            existing.locale = locale;
            existing.clone()
        } else {
            let created = Subscriber::new(chat_id, locale);
            subscribers.push(created.clone());
            created
        };
        self.save(&subscribers)?;
        Ok(subscriber)
    }

    /// Deactivates a subscriber. No-op if the chat id is unknown.
    pub fn deactivate(&self, chat_id: i64) -> Result<()> {
        let mut subscribers = self.load()?;
        if let Some(existing) = subscribers.iter_mut().find(|s| s.chat_id == chat_id) {
            existing.deactivate();
            self.save(&subscribers)?;
        }
        Ok(())
    }

    pub fn find(&self, chat_id: i64) -> Result<Option<Subscriber>> {
        Ok(self.load()?.into_iter().find(|s| s.chat_id == chat_id))
    }

    /// Active subscribers whose chosen locale matches `locale`.
    pub fn active_for_locale(&self, locale: &LocaleTag) -> Result<Vec<Subscriber>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|s| s.active && &s.locale == locale)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tempfile::tempdir;

    #[test]
    fn upsert_creates_then_reactivates() {
        let dir = tempdir().unwrap();
        let store = SubscriberStore::new(dir.path());
        let en = LocaleTag::from_str("en-us").unwrap();
        let es = LocaleTag::from_str("es-es").unwrap();

        store.upsert(1, en.clone()).unwrap();
        store.deactivate(1).unwrap();
        assert!(!store.find(1).unwrap().unwrap().active);

        let reactivated = store.upsert(1, es.clone()).unwrap();
        assert!(reactivated.active);
        assert_eq!(reactivated.locale, es);
    }

    #[test]
    fn inactive_subscriber_is_excluded_from_fanout_selection() {
        let dir = tempdir().unwrap();
        let store = SubscriberStore::new(dir.path());
        let en = LocaleTag::from_str("en-us").unwrap();

        store.upsert(1, en.clone()).unwrap();
        store.upsert(2, en.clone()).unwrap();
        store.deactivate(2).unwrap();

        let active = store.active_for_locale(&en).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].chat_id, 1);
    }
}
