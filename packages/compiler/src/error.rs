//! Error taxonomy for the compile pipeline.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    /// Two different source texts hashed to the same identifier. This is an
    /// integrity failure: proceeding would silently merge unrelated copy, so
    /// the whole build pass stops.
    #[error(
        "identifier collision on \"{id}\": \"{existing_text}\" ({existing_context}) vs \"{incoming_text}\" ({incoming_context})"
    )]
    IdentifierCollision {
        id: String,
        existing_text: String,
        existing_context: String,
        incoming_text: String,
        incoming_context: String,
    },

    /// Reading or writing one persisted resource failed. Other resources in
    /// the same build are unaffected.
    #[error("store error for resource \"{key}\": {source}")]
    Store {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A recoverable, per-file problem surfaced on the build result.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub file: String,
    /// `line:col` of the problem, when known.
    pub location: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{}: {}@{}: {}", self.severity, self.file, loc, self.message),
            None => write!(f, "{}: {}: {}", self.severity, self.file, self.message),
        }
    }
}

impl Diagnostic {
    pub fn from_parse_error(error: &crate::parse_util::ParseError) -> Self {
        Diagnostic {
            severity: match error.level {
                crate::parse_util::ParseErrorLevel::Warning => Severity::Warning,
                crate::parse_util::ParseErrorLevel::Error => Severity::Error,
            },
            message: error.msg.clone(),
            file: error.span.file.url.clone(),
            location: Some(error.span.start.to_string()),
        }
    }
}
