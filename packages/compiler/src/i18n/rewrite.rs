//! Tree rewriting: replaces extracted regions with lookup calls and threads
//! the lookup hook through the file.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::CompilerConfig;
use crate::ml_parser::ast::{Attribute, Element, LetDeclaration, Node, Text};
use crate::ml_parser::tags::is_raw_text_tag;
use crate::ml_parser::tokens::{Token, TokenType};
use crate::ml_parser::ParseResult;
use crate::parse_util::{Loc, ParseError, SourceFile, Span};

use super::assemble::{assemble_children, folds_inline, has_direct_text};
use super::classify::{
    classify_element, has_marker_comment, is_translatable_attribute, parse_overrides,
    Classification, MARKER_COMMENT, OVERRIDES_ATTR, SKIP_ATTR,
};
use super::digest;
use super::fields::extract_fields;
use super::unit::{
    AssembledUnit, Binding, ContextPath, ContextScope, IdentifiedUnit, Segment, TranslatableUnit,
    UnitKind,
};

/// Name of the injected lookup hook declaration.
pub const HOOK_NAME: &str = "t";

/// The element whose raw-text body is the structured metadata document.
pub const METADATA_TAG: &str = "metadata";

static EXISTING_IDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([0-9A-Za-z]{12})""#).unwrap());

#[derive(Debug)]
pub struct RewriteOutcome {
    pub nodes: Vec<Node>,
    pub units: Vec<IdentifiedUnit>,
    /// Ids an already-injected hook still references. The file keeps using
    /// them even though this run extracted nothing for them.
    pub retained_ids: Vec<String>,
    pub diagnostics: Vec<ParseError>,
    pub changed: bool,
}

/// Rewrite one parsed file. Returns the transformed tree together with the
/// units it produced; when nothing was extracted the tree is returned
/// unchanged and `changed` is false.
pub fn rewrite_file(parse: ParseResult, config: &CompilerConfig) -> RewriteOutcome {
    let file = parse.file.clone();
    if config.use_explicit_marker && !has_marker_comment(&parse.root_nodes) {
        // Already-rewritten output has lost its marker but still carries
        // the hook; the ids it references must stay live in the store.
        let retained_ids = existing_hook(&parse.root_nodes)
            .map(|hook| hook.ids)
            .unwrap_or_default();
        log::debug!("skipping {} (no extraction marker)", file.url);
        return RewriteOutcome {
            nodes: parse.root_nodes,
            units: Vec::new(),
            retained_ids,
            diagnostics: Vec::new(),
            changed: false,
        };
    }

    let mut rewriter = Rewriter {
        config,
        file: file.clone(),
        component: component_name(&file.url),
        ordinal: 0,
        units: Vec::new(),
        diagnostics: Vec::new(),
        has_field_units: false,
        changed: false,
    };

    let mut nodes = rewriter.transform_nodes(parse.root_nodes);
    if config.use_explicit_marker {
        strip_marker(&mut nodes);
    }
    let retained_ids = rewriter.thread_hook(&mut nodes);

    RewriteOutcome {
        nodes,
        units: rewriter.units,
        retained_ids,
        diagnostics: rewriter.diagnostics,
        changed: rewriter.changed,
    }
}

/// Server-evaluated files use the awaited lookup form.
pub fn is_server_file(url: &str) -> bool {
    url.split('/')
        .next_back()
        .is_some_and(|name| name.contains(".server."))
}

/// PascalCase component name from the file stem, or `None` when the stem is
/// not a valid identifier source (dynamic segments like `[slug]`).
pub fn component_name(url: &str) -> Option<String> {
    let stem = url.split('/').next_back()?.split('.').next()?;
    if stem.is_empty() || !stem.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut out = String::new();
    for part in stem.split(['-', '_']) {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    Some(out)
}

struct Rewriter<'a> {
    config: &'a CompilerConfig,
    file: Arc<SourceFile>,
    component: Option<String>,
    ordinal: u32,
    units: Vec<IdentifiedUnit>,
    diagnostics: Vec<ParseError>,
    has_field_units: bool,
    changed: bool,
}

impl Rewriter<'_> {
    fn next_context(&mut self) -> ContextPath {
        let scope = match &self.component {
            Some(name) => ContextScope::Component(name.clone()),
            None => {
                let scope = ContextScope::Ordinal(self.ordinal);
                self.ordinal += 1;
                scope
            }
        };
        ContextPath {
            scope,
            file: self.file.url.clone(),
        }
    }

    fn transform_nodes(&mut self, nodes: Vec<Node>) -> Vec<Node> {
        nodes
            .into_iter()
            .map(|node| match node {
                Node::Element(element) => Node::Element(self.transform_element(element)),
                other => other,
            })
            .collect()
    }

    fn transform_element(&mut self, mut element: Element) -> Element {
        if element.name == METADATA_TAG {
            self.transform_metadata(&mut element);
            return element;
        }

        if !is_raw_text_tag(&element.name) {
            self.transform_attributes(&mut element);
        }

        match classify_element(&element) {
            Classification::Translatable => {}
            Classification::Skipped | Classification::Opaque => {
                self.strip_directives_deep(&mut element);
                return element;
            }
        }

        let overrides = parse_overrides(&element, &mut self.diagnostics);
        self.strip_directives(&mut element);

        if has_direct_text(&element.children) {
            // Nested structural elements get their own units first, so the
            // slot bindings below carry their rewritten markup.
            let children = std::mem::take(&mut element.children);
            element.children = self.transform_slot_children(children);
            if let Some(assembled) = assemble_children(&element.children) {
                let context = self.next_context();
                let id = digest::generate(&assembled.canonical_text(), &context);
                let call = lookup_call(&id, &assembled);
                let span = element.span.clone();
                self.units.push(IdentifiedUnit {
                    id,
                    unit: TranslatableUnit {
                        content: assembled,
                        context,
                        kind: UnitKind::Markup,
                        overrides,
                        span: Some(span),
                    },
                });
                element.children = vec![interpolation_node(&self.file, &call)];
                self.changed = true;
            }
        } else {
            let children = std::mem::take(&mut element.children);
            element.children = self.transform_nodes(children);
        }
        element
    }

    /// Prepare children that are about to be assembled: inline-foldable
    /// elements keep their text in the parent unit, while elements that
    /// will become slots are transformed in place and may contribute units
    /// of their own.
    fn transform_slot_children(&mut self, nodes: Vec<Node>) -> Vec<Node> {
        nodes
            .into_iter()
            .map(|node| match node {
                Node::Element(mut element) => {
                    if folds_inline(&element) {
                        let children = std::mem::take(&mut element.children);
                        element.children = self.transform_slot_children(children);
                        Node::Element(element)
                    } else if element.name != METADATA_TAG
                        && !is_raw_text_tag(&element.name)
                        && classify_element(&element) == Classification::Translatable
                    {
                        Node::Element(self.transform_element(element))
                    } else {
                        // Skipped and opaque elements keep their attributes
                        // so the assembler still classifies them; the slot
                        // binding drops the directive attributes itself.
                        Node::Element(element)
                    }
                }
                other => other,
            })
            .collect()
    }

    fn strip_directives(&mut self, element: &mut Element) {
        let before = element.attrs.len();
        element
            .attrs
            .retain(|attr| attr.name != SKIP_ATTR && attr.name != OVERRIDES_ATTR);
        if element.attrs.len() != before {
            self.changed = true;
        }
    }

    fn strip_directives_deep(&mut self, element: &mut Element) {
        self.strip_directives(element);
        for child in &mut element.children {
            if let Node::Element(nested) = child {
                self.strip_directives_deep(nested);
            }
        }
    }

    fn transform_attributes(&mut self, element: &mut Element) {
        let mut rewrites: Vec<(usize, String)> = Vec::new();
        for (index, attr) in element.attrs.iter().enumerate() {
            if !is_translatable_attribute(&attr.name) || !attr.is_literal() {
                continue;
            }
            let normalized = attr.value.split_whitespace().collect::<Vec<_>>().join(" ");
            if normalized.is_empty() {
                continue;
            }
            let context = self.next_context();
            let id = digest::generate(&normalized, &context);
            let call = format!("t(\"{}\", \"{}\")", id, escape_literal(&normalized));
            rewrites.push((index, call));
            self.units.push(IdentifiedUnit {
                id,
                unit: TranslatableUnit {
                    content: AssembledUnit {
                        segments: smallvec::smallvec![Segment::Text(normalized)],
                        bindings: Vec::new(),
                    },
                    context,
                    kind: UnitKind::Attribute,
                    overrides: Default::default(),
                    span: Some(attr.span.clone()),
                },
            });
        }
        for (index, call) in rewrites {
            rewrite_attribute(&mut element.attrs[index], &self.file, &call);
            self.changed = true;
        }
    }

    fn transform_metadata(&mut self, element: &mut Element) {
        let Some(Node::Text(body)) = element.children.first() else {
            return;
        };
        match extract_fields(
            &body.value,
            &self.config.allow_listed_field_paths,
            &self.file.url,
        ) {
            Ok(extraction) => {
                if !extraction.changed {
                    return;
                }
                let rendered = match serde_json::to_string_pretty(&extraction.json) {
                    Ok(text) => text,
                    Err(err) => {
                        self.diagnostics.push(ParseError::warning(
                            element.span.clone(),
                            format!("Could not re-render metadata JSON: {err}"),
                        ));
                        return;
                    }
                };
                let span = synth_span(&self.file);
                element.children = vec![Node::Text(Text {
                    value: format!("\n{rendered}\n"),
                    tokens: vec![Token::new(
                        TokenType::RawText,
                        vec![format!("\n{rendered}\n")],
                        span.clone(),
                    )],
                    span,
                })];
                self.units.extend(extraction.units);
                self.has_field_units = true;
                self.changed = true;
            }
            Err(err) => self.diagnostics.push(ParseError::warning(
                element.span.clone(),
                format!("Malformed metadata JSON: {err}"),
            )),
        }
    }

    /// Inject or refresh the `@let t = …;` hook as the file's first node.
    /// Returns the ids a pre-existing hook already referenced.
    fn thread_hook(&mut self, nodes: &mut Vec<Node>) -> Vec<String> {
        let hook = existing_hook(nodes);
        let retained: Vec<String> = hook.as_ref().map(|h| h.ids.clone()).unwrap_or_default();
        if self.units.is_empty() {
            // Nothing new to thread; leave any existing hook as it is.
            return retained;
        }

        let existing = hook.as_ref().map(|h| h.index);
        let was_async = hook.is_some_and(|h| h.is_async);
        let needs_async = self.has_field_units || is_server_file(&self.file.url);
        let mut ids = retained.clone();
        for identified in &self.units {
            if !ids.contains(&identified.id) {
                ids.push(identified.id.clone());
            }
        }

        let id_list = ids
            .iter()
            .map(|id| format!("\"{id}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let value = if needs_async || was_async {
            format!("await loadMessages([{id_list}])")
        } else {
            format!("useMessages([{id_list}])")
        };
        let span = synth_span(&self.file);

        match existing {
            Some(index) => {
                nodes[index] = Node::Let(LetDeclaration {
                    name: HOOK_NAME.to_string(),
                    value,
                    span,
                });
            }
            None => {
                nodes.insert(
                    0,
                    Node::Let(LetDeclaration {
                        name: HOOK_NAME.to_string(),
                        value,
                        span: span.clone(),
                    }),
                );
                nodes.insert(1, newline_node(&self.file));
            }
        }
        self.changed = true;
        retained
    }
}

struct ExistingHook {
    index: usize,
    ids: Vec<String>,
    is_async: bool,
}

/// The already-injected `@let t = …;` declaration, if the file has one.
fn existing_hook(nodes: &[Node]) -> Option<ExistingHook> {
    nodes.iter().enumerate().find_map(|(index, node)| match node {
        Node::Let(decl) if decl.name == HOOK_NAME => Some(ExistingHook {
            index,
            ids: EXISTING_IDS
                .captures_iter(&decl.value)
                .map(|capture| capture[1].to_string())
                .collect(),
            is_async: decl.value.contains("loadMessages"),
        }),
        _ => None,
    })
}

/// Drop the leading `<!-- i18n -->` marker comment from output.
fn strip_marker(nodes: &mut Vec<Node>) {
    let marker = nodes.iter().position(|node| {
        matches!(node, Node::Comment(comment) if comment.value.trim() == MARKER_COMMENT)
    });
    if let Some(index) = marker {
        nodes.remove(index);
        // Absorb the newline that followed the marker.
        if let Some(Node::Text(text)) = nodes.get(index) {
            if text.value.trim().is_empty() {
                nodes.remove(index);
            }
        }
    }
}

/// Build the `t(...)` expression for an assembled markup unit.
fn lookup_call(id: &str, unit: &AssembledUnit) -> String {
    let fallback = escape_literal(&unit.fallback_text());
    if unit.bindings.is_empty() {
        return format!("t(\"{id}\", \"{fallback}\")");
    }
    let bindings = unit
        .bindings
        .iter()
        .map(|(name, binding)| match binding {
            Binding::Var(var) => var.clone(),
            Binding::Expr(source) => format!("{name}: ({source})"),
            Binding::Tag(markup) => format!("{name}: {markup}"),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("t(\"{id}\", \"{fallback}\", {{ {bindings} }})")
}

fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

fn synth_span(file: &Arc<SourceFile>) -> Span {
    Span::new(file.clone(), Loc::start(), Loc::start())
}

/// A text node holding a single `{expr}` interpolation.
fn interpolation_node(file: &Arc<SourceFile>, expr: &str) -> Node {
    let span = synth_span(file);
    Node::Text(Text {
        value: format!("{{{expr}}}"),
        tokens: vec![Token::new(
            TokenType::Interpolation,
            vec!["{".to_string(), expr.to_string(), "}".to_string()],
            span.clone(),
        )],
        span,
    })
}

fn newline_node(file: &Arc<SourceFile>) -> Node {
    let span = synth_span(file);
    Node::Text(Text {
        value: "\n".to_string(),
        tokens: vec![Token::new(
            TokenType::Text,
            vec!["\n".to_string()],
            span.clone(),
        )],
        span,
    })
}

/// Replace a literal attribute value with a brace-value lookup call.
fn rewrite_attribute(attr: &mut Attribute, file: &Arc<SourceFile>, call: &str) {
    let span = synth_span(file);
    attr.quote = None;
    attr.value = format!("{{{call}}}");
    attr.value_tokens = Some(vec![Token::new(
        TokenType::AttrValueInterpolation,
        vec!["{".to_string(), call.to_string(), "}".to_string()],
        span.clone(),
    )]);
    attr.span = span;
}
