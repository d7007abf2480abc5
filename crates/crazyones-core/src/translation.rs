//! Translation catalog loader.
//!
//! Reads every `*.json` file in the translations directory into a
//! [`crazyones_models::TranslationCatalog`]; the filename stem (e.g.
//! `en-us.json` -> `en-us`) is the UI language key. The catalog's shape
//! and fallback logic live in `crazyones_models::translation` — this
//! module only owns filesystem discovery, matching the split the models
//! crate documents.

use std::collections::HashMap;
use std::path::Path;

use crazyones_models::TranslationCatalog;

use crate::error::{CoreError, Result};

/// Loads every translation file under `dir` into a single catalog.
///
/// A directory that doesn't exist yet yields an empty catalog (the bot
/// falls back to raw keys) rather than an error, since translations are
/// an optional presentation layer, not a correctness dependency.
pub fn load_catalog(dir: &Path) -> Result<TranslationCatalog> {
    let mut languages = HashMap::new();

    if !dir.exists() {
        return Ok(TranslationCatalog::from_languages(languages));
    }

    let entries = std::fs::read_dir(dir).map_err(|e| CoreError::Config(format!("reading {}: {e}", dir.display())))?;

    for entry in entries {
        let entry = entry.map_err(|e| CoreError::Config(format!("reading {}: {e}", dir.display())))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let body = std::fs::read_to_string(&path)
            .map_err(|e| CoreError::Config(format!("reading {}: {e}", path.display())))?;
        let messages: HashMap<String, String> = serde_json::from_str(&body)
            .map_err(|e| CoreError::Config(format!("parsing {}: {e}", path.display())))?;

        languages.insert(lang.to_string(), messages);
    }

    Ok(TranslationCatalog::from_languages(languages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_every_json_file_keyed_by_filename_stem() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("en-us.json"), r#"{"welcome": "Hello, {0}!"}"#).unwrap();
        std::fs::write(dir.path().join("es-es.json"), r#"{"welcome": "¡Hola, {0}!"}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = load_catalog(dir.path()).unwrap();
        assert!(catalog.has_language("en-us"));
        assert!(catalog.has_language("es-es"));

        let (text, _) = catalog.format("es-es", "welcome", &["Mundo"]);
        assert_eq!(text, "¡Hola, Mundo!");
    }

    #[test]
    fn missing_directory_yields_empty_catalog_not_an_error() {
        let catalog = load_catalog(Path::new("/nonexistent/translations/dir")).unwrap();
        assert!(!catalog.has_language("en-us"));
    }
}
