//! Translatable unit model shared by classification, assembly and rewriting.

use std::collections::BTreeMap;
use std::fmt;

use smallvec::SmallVec;

use crate::parse_util::Span;

/// Segment storage; most units are a handful of segments.
pub type Segments = SmallVec<[Segment; 8]>;

/// Where a unit came from inside its component. The scope is part of the
/// hash input, so two identical texts in different scopes keep distinct ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextScope {
    /// A component name derived from the file stem.
    Component(String),
    /// A dotted path into a structured metadata document.
    Field(String),
    /// Fallback for files whose stem is not a valid component name.
    Ordinal(u32),
}

impl fmt::Display for ContextScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextScope::Component(name) => write!(f, "{name}"),
            ContextScope::Field(path) => write!(f, "{path}"),
            ContextScope::Ordinal(n) => write!(f, "#{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextPath {
    pub scope: ContextScope,
    pub file: String,
}

impl fmt::Display for ContextPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.scope, self.file)
    }
}

/// What position the source content occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Markup,
    Attribute,
    Field,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Markup => "markup",
            UnitKind::Attribute => "attribute",
            UnitKind::Field => "field",
        }
    }
}

/// One ordered piece of an assembled unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text, already whitespace-joined.
    Text(String),
    /// An interpolated expression, named for the fallback placeholder.
    Expression { name: String, source: String },
    /// Opening half of a nested inline element placeholder.
    TagOpen(String),
    /// Closing half of a nested inline element placeholder.
    TagClose(String),
    /// A self-closing or void nested element placeholder.
    Slot(String),
}

/// Expressions and nested elements a rewritten call must re-bind, keyed by
/// placeholder name in the order they appear.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A bare identifier reference, passed through by name.
    Var(String),
    /// An arbitrary expression, wrapped in parentheses when re-emitted.
    Expr(String),
    /// A nested element rendered into a named slot.
    Tag(String),
}

/// The assembled form of one extraction candidate, before hashing.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledUnit {
    pub segments: Segments,
    pub bindings: Vec<(String, Binding)>,
}

impl AssembledUnit {
    /// The human-readable fallback: text plus `{name}` placeholders and
    /// inline placeholder tags.
    pub fn fallback_text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Expression { name, .. } => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
                Segment::TagOpen(name) => {
                    out.push('<');
                    out.push_str(name);
                    out.push('>');
                }
                Segment::TagClose(name) => {
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
                Segment::Slot(name) => {
                    out.push('<');
                    out.push_str(name);
                    out.push_str("/>");
                }
            }
        }
        out
    }

    /// The canonical form fed to the identifier hash. Expression sources are
    /// collapsed to a fixed sentinel so renaming a variable never changes the
    /// id, and nested elements become anonymous placeholder markers.
    pub fn canonical_text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Expression { .. } => out.push_str("{…}"),
                Segment::TagOpen(_) => out.push_str("<ph>"),
                Segment::TagClose(_) => out.push_str("</ph>"),
                Segment::Slot(_) => out.push_str("<ph/>"),
            }
        }
        out
    }

    pub fn has_text(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Text(t) if !t.trim().is_empty()))
    }
}

/// A fully assembled translatable unit ready for identification and storage.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatableUnit {
    pub content: AssembledUnit,
    pub context: ContextPath,
    pub kind: UnitKind,
    /// Locale to replacement text, taken from an author override attribute.
    pub overrides: BTreeMap<String, String>,
    pub span: Option<Span>,
}

/// A unit paired with its generated identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifiedUnit {
    pub id: String,
    pub unit: TranslatableUnit,
}
