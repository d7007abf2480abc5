//! Per-locale security-update store (`updates/<locale>.json`) and the
//! id-assignment algorithm that keeps ids stable across ticks.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use crazyones_models::{ContentIdentity, LocaleTag, SecurityUpdate};

use crate::atomic::{atomic_write_json, read_json_optional};
use crate::error::Result;

/// Manages persistence of one locale's ordered `SecurityUpdate` list.
pub struct LocaleStore {
    base_path: PathBuf,
}

/// The set of ids allocated to genuinely new content-identities during a
/// [`LocaleStore::reconcile`] call.
pub type Novelty = BTreeSet<u32>;

impl LocaleStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_path: data_dir.into(),
        }
    }

    fn path(&self, locale: &LocaleTag) -> PathBuf {
        self.base_path.join("updates").join(format!("{}.json", locale))
    }

    /// Loads the current records for a locale, or an empty list if no
    /// store file exists yet.
    pub fn load(&self, locale: &LocaleTag) -> Result<Vec<SecurityUpdate>> {
        Ok(read_json_optional(&self.path(locale))?.unwrap_or_default())
    }

    /// Applies the id-assignment algorithm (spec §4.3) to a freshly
    /// fetched record list and persists the result atomically.
    ///
    /// Matching is primarily by exact content-identity (name, target,
    /// date). As a second pass, a fetched record whose content-identity
    /// has no exact match falls back to matching an existing record with
    /// the same `(name, target)` whose *stored* date was the sentinel —
    /// this is the "date if previously sentinel" refresh case from spec
    /// §4.3: the row failed to date-parse on an earlier tick and now
    /// parses, so it is the same row, not a new one.
    ///
    /// Content-identities (after both passes) that still have no match
    /// receive `max(existing ids) + 1`, assigned in fetch order. Existing
    /// records not matched by either pass are retained, appended after
    /// the current fetch's records in their prior relative order. Returns
    /// the set of newly allocated ids only — never ids that were reused.
    pub fn reconcile(&self, locale: &LocaleTag, fetched: Vec<SecurityUpdate>) -> Result<Novelty> {
        let existing = self.load(locale)?;

        let mut by_identity: HashMap<ContentIdentity, SecurityUpdate> = HashMap::new();
        let mut sentinel_by_name_target: HashMap<(String, String), SecurityUpdate> = HashMap::new();
        for record in &existing {
            by_identity.insert(record.content_identity(), record.clone());
            if record.has_sentinel_date() {
                sentinel_by_name_target.insert((record.name.clone(), record.target.clone()), record.clone());
            }
        }

        let mut next_id = existing.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let mut novelty = Novelty::new();
        let mut matched_identities: BTreeSet<ContentIdentity> = BTreeSet::new();
        let mut matched_sentinels: BTreeSet<(String, String)> = BTreeSet::new();
        let mut current: Vec<SecurityUpdate> = Vec::with_capacity(fetched.len());

        for mut record in fetched {
            let identity = record.content_identity();
            if let Some(prior) = by_identity.get(&identity) {
                record.id = prior.id;
                if record.url.is_none() {
                    record.url = prior.url.clone();
                }
                matched_identities.insert(identity);
            } else {
                let sentinel_key = (record.name.clone(), record.target.clone());
                if !record.has_sentinel_date() && sentinel_by_name_target.contains_key(&sentinel_key) {
                    let prior = &sentinel_by_name_target[&sentinel_key];
                    record.id = prior.id;
                    if record.url.is_none() {
                        record.url = prior.url.clone();
                    }
                    matched_sentinels.insert(sentinel_key);
                } else {
                    record.id = next_id;
                    next_id += 1;
                    novelty.insert(record.id);
                }
            }
            current.push(record);
        }

        let preserved = existing.into_iter().filter(|r| {
            if matched_identities.contains(&r.content_identity()) {
                return false;
            }
            if r.has_sentinel_date() && matched_sentinels.contains(&(r.name.clone(), r.target.clone())) {
                return false;
            }
            true
        });
        current.extend(preserved);

        let path = self.path(locale);
        atomic_write_json(&path, &current)?;

        Ok(novelty)
    }
}
