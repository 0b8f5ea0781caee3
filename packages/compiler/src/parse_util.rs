//! Source files, locations, spans and parse errors shared by the lexer,
//! parser and serializer.

use std::fmt;
use std::sync::Arc;

/// A path-identified unit of input. Immutable for the duration of a
/// pipeline run; the parser hands out `Arc`s so spans stay cheap to clone.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub url: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Arc<Self> {
        Arc::new(SourceFile {
            url: url.into(),
            content: content.into(),
        })
    }
}

/// A cursor position inside a [`SourceFile`]. Lines and columns are
/// zero-based; `offset` is a byte offset at a char boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loc {
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl Loc {
    pub fn start() -> Self {
        Loc {
            offset: 0,
            line: 0,
            col: 0,
        }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A half-open byte range in a source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub file: Arc<SourceFile>,
    pub start: Loc,
    pub end: Loc,
}

impl Span {
    pub fn new(file: Arc<SourceFile>, start: Loc, end: Loc) -> Self {
        Span { file, start, end }
    }

    /// The source text covered by this span.
    pub fn text(&self) -> &str {
        &self.file.content[self.start.offset..self.end.offset]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.file.url, self.start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorLevel {
    Warning,
    Error,
}

/// A recoverable problem found while lexing or parsing one file. Parse
/// errors never abort the build; they surface as per-file diagnostics.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub span: Span,
    pub msg: String,
    pub level: ParseErrorLevel,
}

impl ParseError {
    pub fn new(span: Span, msg: impl Into<String>) -> Self {
        ParseError {
            span,
            msg: msg.into(),
            level: ParseErrorLevel::Error,
        }
    }

    pub fn warning(span: Span, msg: impl Into<String>) -> Self {
        ParseError {
            span,
            msg: msg.into(),
            level: ParseErrorLevel::Warning,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.span, self.msg)
    }
}
