//! Unit assembly: turns the direct children of an element into one ordered
//! sequence of text segments and placeholders.
//!
//! Whitespace handling mirrors user-visible rendering: runs of whitespace
//! inside a text chunk collapse to one space, boundary whitespace between a
//! chunk and an adjacent placeholder survives as a single space, and the
//! assembled unit is trimmed at both ends.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ml_parser::ast::{Element, Node, Text};
use crate::ml_parser::tags::is_component_tag;
use crate::ml_parser::tokens::TokenType;

use crate::ml_parser::serializer::element_to_string;

use super::classify::{
    classify_element, is_inline_tag, Classification, OVERRIDES_ATTR, SKIP_ATTR,
};
use super::unit::{AssembledUnit, Binding, Segment, Segments};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());
static STRING_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^("(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')$"#).unwrap());

/// Assemble the direct children of an element into a unit, or `None` when
/// they carry no direct text and the rewriter should recurse instead.
pub fn assemble_children(children: &[Node]) -> Option<AssembledUnit> {
    if !has_direct_text(children) {
        return None;
    }
    let mut assembler = Assembler::default();
    assembler.push_nodes(children);
    let unit = assembler.finish();
    if unit.has_text() {
        Some(unit)
    } else {
        None
    }
}

/// Whether a children list contains meaningful text at its own level.
/// String-literal interpolations count as text; everything else does not,
/// which is what keeps already-rewritten `{t(...)}` calls from
/// re-extracting.
pub fn has_direct_text(children: &[Node]) -> bool {
    children.iter().any(|node| match node {
        Node::Text(text) => text.tokens.iter().any(|token| match token.kind {
            TokenType::Text => !token.part(0).trim().is_empty(),
            TokenType::Interpolation => {
                string_literal_value(token.part(1)).is_some_and(|v| !v.trim().is_empty())
            }
            _ => false,
        }),
        _ => false,
    })
}

/// If the expression is a plain string literal, its unescaped value.
fn string_literal_value(expr: &str) -> Option<String> {
    let trimmed = expr.trim();
    if !STRING_LITERAL.is_match(trimmed) {
        return None;
    }
    let inner = &trimmed[1..trimmed.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                match next {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    other => out.push(other),
                }
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

#[derive(Default)]
struct Assembler {
    segments: Segments,
    bindings: Vec<(String, Binding)>,
    expr_count: u32,
    elem_count: u32,
    pending_space: bool,
}

impl Assembler {
    fn push_nodes(&mut self, nodes: &[Node]) {
        for node in nodes {
            match node {
                Node::Text(text) => self.push_text_node(text),
                Node::Element(element) => self.push_element(element),
                Node::Comment(_) | Node::Let(_) => {}
            }
        }
    }

    fn push_text_node(&mut self, text: &Text) {
        for token in &text.tokens {
            match token.kind {
                TokenType::Text => self.push_text_chunk(token.part(0)),
                TokenType::Interpolation => self.push_expression(token.part(1)),
                _ => {}
            }
        }
    }

    fn push_text_chunk(&mut self, chunk: &str) {
        let normalized = chunk.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            if !self.segments.is_empty() {
                self.pending_space = true;
            }
            return;
        }
        let leading = chunk.starts_with(|c: char| c.is_whitespace());
        if (self.pending_space || leading) && !self.segments.is_empty() {
            self.append_text(" ");
        }
        self.append_text(&normalized);
        self.pending_space = chunk.ends_with(|c: char| c.is_whitespace());
    }

    fn push_expression(&mut self, expr: &str) {
        if let Some(literal) = string_literal_value(expr) {
            // Inline string literals read as text to the user.
            self.push_text_chunk(&literal);
            return;
        }
        self.flush_space();
        let trimmed = expr.trim();
        let name = if IDENTIFIER.is_match(trimmed) {
            let name = trimmed.to_string();
            if !self.bindings.iter().any(|(n, _)| n == &name) {
                self.bindings.push((name.clone(), Binding::Var(name.clone())));
            }
            name
        } else {
            let name = format!("expr{}", self.expr_count);
            self.expr_count += 1;
            self.bindings
                .push((name.clone(), Binding::Expr(trimmed.to_string())));
            name
        };
        self.segments.push(Segment::Expression {
            name,
            source: trimmed.to_string(),
        });
    }

    fn push_element(&mut self, element: &Element) {
        self.flush_space();
        let name = format!("{}{}", element.name.to_ascii_lowercase(), self.elem_count);
        self.elem_count += 1;

        if folds_inline(element) {
            self.bindings
                .push((name.clone(), Binding::Tag(element_shell(element))));
            self.segments.push(Segment::TagOpen(name.clone()));
            self.push_nodes(&element.children);
            self.pending_space = false;
            self.segments.push(Segment::TagClose(name));
        } else {
            // Components, voids and opted-out elements stay whole; the
            // binding carries the full element markup.
            self.bindings
                .push((name.clone(), Binding::Tag(slot_markup(element))));
            self.segments.push(Segment::Slot(name));
        }
        self.pending_space = false;
    }

    fn flush_space(&mut self) {
        if self.pending_space && !self.segments.is_empty() {
            self.append_text(" ");
        }
        self.pending_space = false;
    }

    fn append_text(&mut self, text: &str) {
        if let Some(Segment::Text(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Text(text.to_string()));
        }
    }

    fn finish(self) -> AssembledUnit {
        AssembledUnit {
            segments: self.segments,
            bindings: self.bindings,
        }
    }
}

/// Whether a nested element folds into its parent's unit as a
/// `<tagN>`/`</tagN>` pair instead of an opaque slot.
pub fn folds_inline(element: &Element) -> bool {
    is_inline_tag(&element.name)
        && !is_component_tag(&element.name)
        && classify_element(element) == Classification::Translatable
        && !element.is_void
        && !element.is_self_closing
}

/// A self-closing shell of an element, keeping its attributes:
/// `<b class="x">…</b>` becomes `<b class="x" />`.
fn element_shell(element: &Element) -> String {
    let mut shell = element.clone();
    strip_directive_attrs(&mut shell);
    shell.children.clear();
    shell.is_self_closing = true;
    element_to_string(&shell)
}

/// Markup for a slotted element. Serialized from the node rather than read
/// from its source span, so rewrites inside the element are reflected and
/// build-time directive attributes never reach the binding.
fn slot_markup(element: &Element) -> String {
    let mut slotted = element.clone();
    strip_directive_attrs(&mut slotted);
    element_to_string(&slotted)
}

fn strip_directive_attrs(element: &mut Element) {
    element
        .attrs
        .retain(|attr| attr.name != SKIP_ATTR && attr.name != OVERRIDES_ATTR);
    for child in &mut element.children {
        if let Node::Element(nested) = child {
            strip_directive_attrs(nested);
        }
    }
}
