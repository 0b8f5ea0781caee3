//! Markup AST node definitions.
//!
//! A `Text` node covers a run of literal text and interpolations; the
//! original token sequence is kept on the node so that extraction can see
//! individual interpolations and the serializer can reproduce the source
//! exactly.

use crate::parse_util::Span;

use super::tokens::Token;

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(Text),
    Comment(Comment),
    Let(LetDeclaration),
}

impl Node {
    pub fn span(&self) -> &Span {
        match self {
            Node::Element(e) => &e.span,
            Node::Text(t) => &t.span,
            Node::Comment(c) => &c.span,
            Node::Let(l) => &l.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
    pub is_self_closing: bool,
    pub is_void: bool,
    /// Span of the whole element including the closing tag.
    pub span: Span,
    /// Span of the opening tag only.
    pub start_span: Span,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attrs.iter().find(|a| a.name == name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    /// The raw value with interpolation delimiters included. Empty for
    /// bare attributes.
    pub value: String,
    /// Value tokens (`AttrValueText` / `AttrValueInterpolation`), in
    /// source order. `None` for bare attributes.
    pub value_tokens: Option<Vec<Token>>,
    pub quote: Option<char>,
    pub span: Span,
}

impl Attribute {
    /// True when the value is exactly one literal piece of text.
    pub fn is_literal(&self) -> bool {
        match &self.value_tokens {
            Some(tokens) => {
                tokens.len() == 1
                    && matches!(tokens[0].kind, super::tokens::TokenType::AttrValueText)
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Text {
    /// Raw source text, interpolation delimiters included.
    pub value: String,
    /// `Text` and `Interpolation` tokens making up this node.
    pub tokens: Vec<Token>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct LetDeclaration {
    pub name: String,
    pub value: String,
    pub span: Span,
}
