//! The transient inter-process trigger document.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::locale::LocaleTag;

/// Maps each locale to the set of update ids newly observed in the
/// monitor's last tick. Serializes with locale keys and ascending-sorted
/// id arrays, matching the bit-exact wire format in the data directory
/// contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trigger(BTreeMap<LocaleTag, BTreeSet<u32>>);

impl Trigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a novelty set for a locale. A call with an empty set is a
    /// no-op so the trigger never carries empty arrays.
    pub fn insert(&mut self, locale: LocaleTag, ids: BTreeSet<u32>) {
        if !ids.is_empty() {
            self.0.insert(locale, ids);
        }
    }

    /// True when no locale has any novelty — the monitor must not write
    /// a trigger file in this case.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|ids| ids.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LocaleTag, &BTreeSet<u32>)> {
        self.0.iter()
    }

    pub fn get(&self, locale: &LocaleTag) -> Option<&BTreeSet<u32>> {
        self.0.get(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn empty_ids_are_not_inserted() {
        let mut trigger = Trigger::new();
        trigger.insert(LocaleTag::from_str("en-us").unwrap(), BTreeSet::new());
        assert!(trigger.is_empty());
    }

    #[test]
    fn wire_format_sorts_ids_ascending() {
        let mut trigger = Trigger::new();
        let mut ids = BTreeSet::new();
        ids.insert(413);
        ids.insert(412);
        trigger.insert(LocaleTag::from_str("en-us").unwrap(), ids);

        let json = serde_json::to_string(&trigger).unwrap();
        assert_eq!(json, r#"{"en-us":[412,413]}"#);
    }
}
