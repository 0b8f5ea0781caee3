//! Reconciliation of extracted units against the persisted store.

use chrono::{DateTime, Utc};

use crate::error::CompileError;
use crate::i18n::unit::IdentifiedUnit;

use super::schema::{EntryRecord, MetadataStore};

/// Merge the units one file produced into the store.
///
/// Existing entries are refreshed, new entries inserted, and entries the
/// file no longer produces are marked stale. `retained_ids` are ids the
/// file still references without having re-extracted them (an injected
/// hook from a previous run); they stay fresh. An id whose recorded text
/// or context disagrees with the incoming unit is an integrity failure
/// and aborts the build.
pub fn upsert_file(
    store: &mut MetadataStore,
    file_path: &str,
    units: &[IdentifiedUnit],
    retained_ids: &[String],
    now: DateTime<Utc>,
) -> Result<(), CompileError> {
    let mut current_ids: Vec<String> = Vec::new();

    for identified in units {
        let id = &identified.id;
        let unit = &identified.unit;
        let source_text = unit.content.fallback_text();
        let context = unit.context.to_string();

        if let Some(existing) = store.entries.get_mut(id) {
            if existing.source_text != source_text || existing.context != context {
                return Err(CompileError::IdentifierCollision {
                    id: id.clone(),
                    existing_text: existing.source_text.clone(),
                    existing_context: existing.context.clone(),
                    incoming_text: source_text,
                    incoming_context: context,
                });
            }
            existing.last_seen_at = now;
            existing.stale = false;
            existing.missing_builds = 0;
            existing.overrides = unit.overrides.clone();
        } else {
            log::debug!("registering entry {id} from {file_path}");
            store.entries.insert(
                id.clone(),
                EntryRecord {
                    source_text,
                    context,
                    kind: unit.kind.as_str().to_string(),
                    overrides: unit.overrides.clone(),
                    translations: Default::default(),
                    first_seen_at: now,
                    last_seen_at: now,
                    stale: false,
                    missing_builds: 0,
                },
            );
        }
        if !current_ids.contains(id) {
            current_ids.push(id.clone());
        }
    }

    for id in retained_ids {
        if let Some(entry) = store.entries.get_mut(id) {
            entry.last_seen_at = now;
            entry.stale = false;
            entry.missing_builds = 0;
            if !current_ids.contains(id) {
                current_ids.push(id.clone());
            }
        }
    }

    // Ids the file produced last time but not anymore go stale. Their
    // translations survive until the sweep removes them.
    if let Some(previous) = store.files.get(file_path) {
        for id in previous.clone() {
            if current_ids.contains(&id) {
                continue;
            }
            if let Some(entry) = store.entries.get_mut(&id) {
                if !entry.stale {
                    log::debug!("entry {id} from {file_path} went stale");
                    entry.stale = true;
                }
            }
        }
    }

    if current_ids.is_empty() {
        store.files.shift_remove(file_path);
    } else {
        store.files.insert(file_path.to_string(), current_ids);
    }
    store.refresh_stats(now);
    Ok(())
}

/// End-of-build pass: ages stale entries and hard-deletes the ones that
/// stayed stale for at least `gc_after_builds` full builds.
pub fn sweep(store: &mut MetadataStore, gc_after_builds: Option<u32>, now: DateTime<Utc>) {
    for entry in store.entries.values_mut() {
        if entry.stale {
            entry.missing_builds += 1;
        }
    }
    if let Some(threshold) = gc_after_builds {
        let before = store.entries.len();
        store
            .entries
            .retain(|_, entry| !(entry.stale && entry.missing_builds >= threshold));
        let removed = before - store.entries.len();
        if removed > 0 {
            log::debug!("swept {removed} stale entries");
            // Drop swept ids from the reverse index as well.
            let live: Vec<String> = store.entries.keys().cloned().collect();
            for ids in store.files.values_mut() {
                ids.retain(|id| live.contains(id));
            }
            store.files.retain(|_, ids| !ids.is_empty());
        }
    }
    store.refresh_stats(now);
}
