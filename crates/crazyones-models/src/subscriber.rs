//! Telegram subscriber state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::locale::LocaleTag;

/// A Telegram chat subscribed to release notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub chat_id: i64,
    pub locale: LocaleTag,
    pub ui_lang: String,
    pub active: bool,
    pub since: DateTime<Utc>,
}

impl Subscriber {
    /// Creates a newly-subscribing chat, defaulting its UI language to
    /// its chosen locale.
    pub fn new(chat_id: i64, locale: LocaleTag) -> Self {
        let ui_lang = locale.as_str().to_string();
        Self {
            chat_id,
            locale,
            ui_lang,
            active: true,
            since: Utc::now(),
        }
    }

    pub fn reactivate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn new_subscriber_defaults_ui_lang_to_locale() {
        let sub = Subscriber::new(42, LocaleTag::from_str("es-es").unwrap());
        assert_eq!(sub.ui_lang, "es-es");
        assert!(sub.active);
    }
}
