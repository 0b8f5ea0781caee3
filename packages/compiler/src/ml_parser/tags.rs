//! Tag classification tables for the component markup dialect.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// HTML void elements: no children, no closing tag.
static VOID_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
        "track", "wbr",
    ]
    .into_iter()
    .collect()
});

/// Elements whose content is opaque text for the lexer. `metadata` carries
/// the structured JSON configuration object.
static RAW_TEXT_TAGS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["script", "style", "metadata"].into_iter().collect());

pub fn is_void_tag(name: &str) -> bool {
    VOID_TAGS.contains(name)
}

pub fn is_raw_text_tag(name: &str) -> bool {
    RAW_TEXT_TAGS.contains(name)
}

/// Tags starting with an uppercase letter reference a distinct component.
pub fn is_component_tag(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}
