//! Extraction from structured metadata documents.
//!
//! A `<metadata>` element carries a JSON object; only string fields on the
//! configured allow-list are extracted. Each extracted field is replaced in
//! place by a `{"$t": [id, fallback]}` marker the runtime resolves.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use smallvec::smallvec;

use super::digest;
use super::unit::{
    AssembledUnit, ContextPath, ContextScope, IdentifiedUnit, Segment, TranslatableUnit, UnitKind,
};

/// Marker key for an already-extracted field.
pub const FIELD_MARKER: &str = "$t";

static ARRAY_INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]").unwrap());

#[derive(Debug)]
pub struct FieldExtraction {
    pub json: Value,
    pub units: Vec<IdentifiedUnit>,
    pub changed: bool,
}

/// Walk a metadata JSON document, extract allow-listed string fields and
/// rewrite them to `$t` markers.
pub fn extract_fields(
    json_text: &str,
    allow_list: &[String],
    file: &str,
) -> Result<FieldExtraction, serde_json::Error> {
    let mut json: Value = serde_json::from_str(json_text)?;
    let mut units = Vec::new();
    walk(&mut json, String::new(), allow_list, file, &mut units);
    let changed = !units.is_empty();
    Ok(FieldExtraction {
        json,
        units,
        changed,
    })
}

fn walk(
    value: &mut Value,
    path: String,
    allow_list: &[String],
    file: &str,
    units: &mut Vec<IdentifiedUnit>,
) {
    match value {
        Value::Object(map) => {
            if map.contains_key(FIELD_MARKER) {
                // Already extracted on a previous run.
                return;
            }
            for (key, child) in map.iter_mut() {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                walk(child, child_path, allow_list, file, units);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter_mut().enumerate() {
                walk(child, format!("{path}[{index}]"), allow_list, file, units);
            }
        }
        Value::String(text) => {
            if path.is_empty() || !is_allow_listed(&path, allow_list) {
                return;
            }
            let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if normalized.is_empty() {
                return;
            }
            let context = ContextPath {
                scope: ContextScope::Field(path),
                file: file.to_string(),
            };
            let id = digest::generate(&normalized, &context);
            units.push(IdentifiedUnit {
                id: id.clone(),
                unit: TranslatableUnit {
                    content: AssembledUnit {
                        segments: smallvec![Segment::Text(normalized.clone())],
                        bindings: Vec::new(),
                    },
                    context,
                    kind: UnitKind::Field,
                    overrides: Default::default(),
                    span: None,
                },
            });
            *value = serde_json::json!({ FIELD_MARKER: [id, normalized] });
        }
        _ => {}
    }
}

/// A concrete path matches an allow-list entry exactly, or after its array
/// indices are generalized to `[*]`.
fn is_allow_listed(path: &str, allow_list: &[String]) -> bool {
    let generalized = ARRAY_INDEX.replace_all(path, "[*]");
    allow_list
        .iter()
        .any(|entry| entry == path || *entry == generalized)
}
