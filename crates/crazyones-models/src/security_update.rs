//! A single parsed row from a locale's security-updates table.

use serde::{Deserialize, Serialize};

/// Sentinel ISO date stored when a locale's date grammar fails to parse
/// the rendered date string.
pub const SENTINEL_DATE: &str = "0000-00-00";

/// One row parsed from a locale's releases table.
///
/// Field order matches the stable wire shape declared in the data
/// directory contract (`id, name, url, target, date`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityUpdate {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub target: String,
    pub date: String,
}

impl SecurityUpdate {
    /// The tuple identity used to recognize a re-observation across ticks.
    pub fn content_identity(&self) -> ContentIdentity {
        ContentIdentity {
            name: self.name.clone(),
            target: self.target.clone(),
            date: self.date.clone(),
        }
    }

    pub fn has_sentinel_date(&self) -> bool {
        self.date == SENTINEL_DATE
    }
}

/// `(name, target, date)` — the tuple used to recognize a record across
/// fetches, independent of its assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentIdentity {
    pub name: String,
    pub target: String,
    pub date: String,
}
