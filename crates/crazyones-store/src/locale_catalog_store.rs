//! Persistence for the locale catalog (`language_urls.json` /
//! `language_names.json`).

use std::collections::BTreeMap;
use std::path::PathBuf;

use crazyones_models::{LocaleCatalog, LocaleTag};

use crate::atomic::{atomic_write_json, read_json_optional};
use crate::error::Result;

/// Reads and writes the locale catalog. Exclusively written by the
/// monitor; read by both binaries.
pub struct LocaleCatalogStore {
    urls_path: PathBuf,
    names_path: PathBuf,
}

impl LocaleCatalogStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            urls_path: data_dir.join("language_urls.json"),
            names_path: data_dir.join("language_names.json"),
        }
    }

    /// Loads the catalog, or an empty one if this is the first run.
    pub fn load(&self) -> Result<LocaleCatalog> {
        let urls: BTreeMap<LocaleTag, String> = read_json_optional(&self.urls_path)?.unwrap_or_default();
        let names: BTreeMap<LocaleTag, String> = read_json_optional(&self.names_path)?.unwrap_or_default();
        Ok(LocaleCatalog::from_parts(urls, names))
    }

    /// Persists the catalog atomically, one file per map.
    pub fn save(&self, catalog: &LocaleCatalog) -> Result<()> {
        atomic_write_json(&self.urls_path, catalog.urls())?;
        atomic_write_json(&self.names_path, catalog.names())?;
        Ok(())
    }
}
