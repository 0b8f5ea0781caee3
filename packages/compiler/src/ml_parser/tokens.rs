//! Token definitions for the component markup lexer.

use crate::parse_util::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// `<name`; parts: `[name]`
    TagOpenStart,
    /// `>` closing an open tag
    TagOpenEnd,
    /// `/>` closing a self-closing tag
    TagOpenEndVoid,
    /// `</name>`; parts: `[name]`
    TagClose,
    /// Literal text run; parts: `[text]`
    Text,
    /// `{expr}` in text position; parts: `["{", expr, "}"]`
    Interpolation,
    /// Content of a raw-text element (`script`, `style`, `metadata`);
    /// parts: `[text]`
    RawText,
    /// `<!-- ... -->`; parts: `[content]`
    Comment,
    /// Attribute name; parts: `[name]`
    AttrName,
    /// Opening or closing attribute quote; parts: `[quote]`
    AttrQuote,
    /// Literal piece of an attribute value; parts: `[text]`
    AttrValueText,
    /// `{expr}` inside an attribute value; parts: `["{", expr, "}"]`
    AttrValueInterpolation,
    /// `@let name`; parts: `[name]`
    LetStart,
    /// Everything between `=` and `;`; parts: `[value]`
    LetValue,
    /// The terminating `;`
    LetEnd,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenType,
    pub parts: Vec<String>,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenType, parts: Vec<String>, span: Span) -> Self {
        Token { kind, parts, span }
    }

    /// First (often only) part, or the empty string.
    pub fn part(&self, index: usize) -> &str {
        self.parts.get(index).map(String::as_str).unwrap_or("")
    }
}
