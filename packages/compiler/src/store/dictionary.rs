//! Flat per-locale dictionaries projected from the store.
//!
//! This is the artifact the runtime lookup and the translation fetcher
//! consume: `{ id → text }`, one document per locale.

use indexmap::IndexMap;

use super::schema::MetadataStore;

/// Project the store into a dictionary for one locale. For the source
/// locale every live entry maps to its source text; for target locales an
/// entry appears only when an author override or a fetched translation
/// exists, overrides winning.
pub fn project(store: &MetadataStore, locale: &str, source_locale: &str) -> IndexMap<String, String> {
    let mut dictionary = IndexMap::new();
    for (id, entry) in &store.entries {
        if entry.stale {
            continue;
        }
        let text = if locale == source_locale {
            Some(entry.source_text.as_str())
        } else {
            entry
                .overrides
                .get(locale)
                .or_else(|| entry.translations.get(locale))
                .map(|s| s.as_str())
        };
        if let Some(text) = text {
            dictionary.insert(id.clone(), text.to_string());
        }
    }
    dictionary
}
