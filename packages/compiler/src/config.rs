//! Compiler configuration.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Token in [`CompilerConfig::resource_key_pattern`] replaced by the
/// directory of the file being compiled.
pub const DIR_TOKEN: &str = "{dir}";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerConfig {
    /// Locale the source files are written in.
    pub source_locale: String,
    /// Locales the project translates into.
    pub target_locales: Vec<String>,
    /// When true, only files whose first node is the `<!-- i18n -->`
    /// comment are processed.
    pub use_explicit_marker: bool,
    /// Metadata field paths eligible for extraction. `[*]` matches any
    /// array index.
    pub allow_listed_field_paths: Vec<String>,
    /// Where extracted entries are persisted, relative to the project root.
    /// Also the unit of write serialization: one lock per resolved key.
    pub resource_key_pattern: String,
    /// Hard-delete entries that stayed stale for this many consecutive
    /// builds. `None` keeps stale entries forever.
    pub gc_after_builds: Option<u32>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            source_locale: "en".to_string(),
            target_locales: Vec::new(),
            use_explicit_marker: false,
            allow_listed_field_paths: vec![
                "title".to_string(),
                "description".to_string(),
                "title.template".to_string(),
                "title.default".to_string(),
                "openGraph.title".to_string(),
                "openGraph.description".to_string(),
                "openGraph.images[*].alt".to_string(),
                "twitter.title".to_string(),
                "twitter.description".to_string(),
                "twitter.images[*].alt".to_string(),
                "appleWebApp.title".to_string(),
            ],
            resource_key_pattern: "i18n/metadata.json".to_string(),
            gc_after_builds: None,
        }
    }
}

impl CompilerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading compiler config {}", path.display()))?;
        let config: CompilerConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing compiler config {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the resource key for a source file path.
    pub fn resource_key(&self, file_path: &str) -> String {
        if !self.resource_key_pattern.contains(DIR_TOKEN) {
            return self.resource_key_pattern.clone();
        }
        let dir = match file_path.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => ".",
        };
        self.resource_key_pattern.replace(DIR_TOKEN, dir)
    }
}
