//! UI translation catalog types.
//!
//! Loading from disk lives in `crazyones-core::translation` (the core
//! crate owns filesystem discovery); this crate only defines the shape
//! and the placeholder-substitution logic so both the loader and its
//! callers agree on it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default UI language used when a subscriber's chosen language has no
/// translation file.
pub const DEFAULT_UI_LANG: &str = "en-us";

/// A mapping from UI language to mapping from message key to template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationCatalog {
    languages: HashMap<String, HashMap<String, String>>,
}

impl TranslationCatalog {
    pub fn from_languages(languages: HashMap<String, HashMap<String, String>>) -> Self {
        Self { languages }
    }

    pub fn has_language(&self, ui_lang: &str) -> bool {
        self.languages.contains_key(ui_lang)
    }

    /// Looks up `key` in `ui_lang`, falling back to
    /// [`DEFAULT_UI_LANG`] and finally to the raw key, substituting
    /// positional `{0}`, `{1}`, ... placeholders in order.
    ///
    /// Returns the formatted string plus whether a fallback was used, so
    /// callers can log it.
    pub fn format(&self, ui_lang: &str, key: &str, args: &[&str]) -> (String, Fallback) {
        let (template, fallback) = if let Some(template) = self.languages.get(ui_lang).and_then(|m| m.get(key)) {
            (template.clone(), Fallback::None)
        } else if let Some(template) = self
            .languages
            .get(DEFAULT_UI_LANG)
            .and_then(|m| m.get(key))
        {
            (template.clone(), Fallback::DefaultLanguage)
        } else {
            (key.to_string(), Fallback::RawKey)
        };

        (substitute(&template, args), fallback)
    }
}

/// Records whether [`TranslationCatalog::format`] had to fall back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    None,
    DefaultLanguage,
    RawKey,
}

fn substitute(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let bytes = template.as_bytes();

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(close) = template[i..].find('}') {
                let close = i + close;
                if let Ok(index) = template[i + 1..close].parse::<usize>() {
                    if let Some(value) = args.get(index) {
                        out.push_str(value);
                        i = close + 1;
                        continue;
                    }
                }
            }
        }
        let ch = template[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TranslationCatalog {
        let mut en = HashMap::new();
        en.insert("welcome".to_string(), "Hello, {0}!".to_string());
        let mut languages = HashMap::new();
        languages.insert(DEFAULT_UI_LANG.to_string(), en);
        TranslationCatalog::from_languages(languages)
    }

    #[test]
    fn formats_in_requested_language() {
        let catalog = catalog();
        let (text, fallback) = catalog.format(DEFAULT_UI_LANG, "welcome", &["World"]);
        assert_eq!(text, "Hello, World!");
        assert_eq!(fallback, Fallback::None);
    }

    #[test]
    fn falls_back_to_default_language_then_raw_key() {
        let catalog = catalog();
        let (text, fallback) = catalog.format("ja-jp", "welcome", &["World"]);
        assert_eq!(text, "Hello, World!");
        assert_eq!(fallback, Fallback::DefaultLanguage);

        let (text, fallback) = catalog.format("ja-jp", "missing_key", &[]);
        assert_eq!(text, "missing_key");
        assert_eq!(fallback, Fallback::RawKey);
    }

    #[test]
    fn substitutes_multiple_positional_placeholders_in_order() {
        assert_eq!(substitute("{1} then {0}", &["a", "b"]), "b then a");
    }
}
