//! Persisted metadata store schema.
//!
//! Entry and file maps are `IndexMap`s so the serialized JSON keeps a
//! deterministic order and diffs stay small across builds.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    /// The fallback text as extracted, placeholders included.
    pub source_text: String,
    /// `scope::file` context the id was derived from.
    pub context: String,
    /// "markup", "attribute" or "field".
    pub kind: String,
    /// Author-provided per-locale replacements.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, String>,
    /// Fetched translations, locale to text.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub translations: BTreeMap<String, String>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    /// Set when the entry stopped appearing in the source tree. Stale
    /// entries keep their translations until swept.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stale: bool,
    /// Consecutive full builds the entry stayed stale.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub missing_builds: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_entries: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataStore {
    pub version: u32,
    /// Identifier to entry, in first-seen order.
    #[serde(default)]
    pub entries: IndexMap<String, EntryRecord>,
    /// Reverse index: source file to the ids it currently produces.
    #[serde(default)]
    pub files: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub stats: StoreStats,
}

impl Default for MetadataStore {
    fn default() -> Self {
        MetadataStore {
            version: STORE_VERSION,
            entries: IndexMap::new(),
            files: IndexMap::new(),
            stats: StoreStats::default(),
        }
    }
}

impl MetadataStore {
    /// Recompute derived statistics. Called on every save.
    pub fn refresh_stats(&mut self, now: DateTime<Utc>) {
        self.stats.total_entries = self.entries.len();
        self.stats.last_updated = Some(now);
    }
}
