//! Content classification: which elements, attributes and text runs are
//! candidates for extraction.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;

use crate::ml_parser::ast::{Element, Node};
use crate::parse_util::ParseError;

/// Elements whose content is never translated, regardless of markers.
static NON_TRANSLATABLE_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["code", "pre", "script", "style", "kbd", "samp", "var"]
        .into_iter()
        .collect()
});

/// Inline formatting elements that fold into their parent's unit as
/// placeholder tags instead of opening their own unit.
static INLINE_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "abbr", "b", "em", "i", "mark", "s", "small", "span", "strong", "sub", "sup", "u",
    ]
    .into_iter()
    .collect()
});

/// Attributes whose literal string values are user-visible copy.
static TRANSLATABLE_ATTRIBUTES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "title",
        "aria-label",
        "aria-description",
        "alt",
        "label",
        "description",
        "placeholder",
        "content",
        "subtitle",
    ]
    .into_iter()
    .collect()
});

/// Build-time marker attributes the rewriter strips from output.
pub const SKIP_ATTR: &str = "data-i18n-skip";
pub const OVERRIDES_ATTR: &str = "i18n-overrides";

/// The opt-in marker comment value, whitespace-insensitive.
pub const MARKER_COMMENT: &str = "i18n";

pub fn is_non_translatable_tag(name: &str) -> bool {
    NON_TRANSLATABLE_TAGS.contains(name)
}

pub fn is_inline_tag(name: &str) -> bool {
    INLINE_TAGS.contains(name)
}

pub fn is_translatable_attribute(name: &str) -> bool {
    TRANSLATABLE_ATTRIBUTES.contains(name)
}

/// How an element participates in extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Descend into the element and extract from its content.
    Translatable,
    /// Leave the subtree untouched; attributes may still be extracted.
    Opaque,
    /// Author opted the subtree out. Like `Opaque`, but the marker
    /// attribute is stripped from output.
    Skipped,
}

pub fn classify_element(element: &Element) -> Classification {
    if element.has_attr(SKIP_ATTR) {
        return Classification::Skipped;
    }
    if is_non_translatable_tag(&element.name) {
        return Classification::Opaque;
    }
    if let Some(attr) = element.attr("translate") {
        if attr.value.eq_ignore_ascii_case("no") {
            return Classification::Opaque;
        }
    }
    Classification::Translatable
}

/// Whether the file opted in, when the explicit marker mode is on: the
/// first non-whitespace root node must be the `<!-- i18n -->` comment.
pub fn has_marker_comment(nodes: &[Node]) -> bool {
    for node in nodes {
        match node {
            Node::Text(text) if text.value.trim().is_empty() => continue,
            Node::Comment(comment) => return comment.value.trim() == MARKER_COMMENT,
            _ => return false,
        }
    }
    false
}

/// Parse an `i18n-overrides` attribute value into a locale map. Malformed
/// JSON or non-string values degrade to a warning; the element is still
/// extracted without overrides.
pub fn parse_overrides(
    element: &Element,
    warnings: &mut Vec<ParseError>,
) -> BTreeMap<String, String> {
    let mut overrides = BTreeMap::new();
    let Some(attr) = element.attr(OVERRIDES_ATTR) else {
        return overrides;
    };
    if attr.value_tokens.is_none() {
        warnings.push(ParseError::warning(
            attr.span.clone(),
            format!("\"{OVERRIDES_ATTR}\" needs a JSON object value"),
        ));
        return overrides;
    }
    // The value reads as `{…}`, so the lexer saw it as an interpolation;
    // the raw value is the JSON text either way.
    match serde_json::from_str::<serde_json::Value>(&attr.value) {
        Ok(serde_json::Value::Object(map)) => {
            for (locale, value) in map {
                match value {
                    serde_json::Value::String(text) => {
                        overrides.insert(locale, text);
                    }
                    _ => warnings.push(ParseError::warning(
                        attr.span.clone(),
                        format!("Override for locale \"{locale}\" is not a string"),
                    )),
                }
            }
        }
        Ok(_) => warnings.push(ParseError::warning(
            attr.span.clone(),
            format!("\"{OVERRIDES_ATTR}\" must be a JSON object"),
        )),
        Err(err) => warnings.push(ParseError::warning(
            attr.span.clone(),
            format!("Malformed \"{OVERRIDES_ATTR}\" JSON: {err}"),
        )),
    }
    overrides
}
