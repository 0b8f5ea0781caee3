//! Prints a markup AST back to source text.
//!
//! Untouched nodes reproduce their source text, so a rewrite only changes
//! the regions the rewriter touched. Every node start is recorded as a
//! generated-to-original position mapping.

use serde::Serialize;

use super::ast::{Attribute, Element, Node};
use super::tags::is_raw_text_tag;
use crate::parse_util::Loc;

/// One generated-position to original-position entry. Lines and columns
/// are zero-based, matching [`Loc`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub generated_line: usize,
    pub generated_col: usize,
    pub original_line: usize,
    pub original_col: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub file: String,
    pub mappings: Vec<Mapping>,
}

pub fn serialize(nodes: &[Node], file_url: &str) -> (String, SourceMap) {
    let mut printer = Printer::new(file_url);
    printer.print_nodes(nodes);
    (
        printer.out,
        SourceMap {
            file: file_url.to_string(),
            mappings: printer.mappings,
        },
    )
}

/// Print a single element to a string, without position mappings.
pub fn element_to_string(element: &Element) -> String {
    let mut printer = Printer::new("");
    printer.print_element(element);
    printer.out
}

struct Printer {
    out: String,
    line: usize,
    col: usize,
    mappings: Vec<Mapping>,
    #[allow(dead_code)]
    file_url: String,
}

impl Printer {
    fn new(file_url: &str) -> Self {
        Printer {
            out: String::new(),
            line: 0,
            col: 0,
            mappings: Vec::new(),
            file_url: file_url.to_string(),
        }
    }

    fn write(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }
        self.out.push_str(text);
    }

    fn map_to(&mut self, original: Loc) {
        self.mappings.push(Mapping {
            generated_line: self.line,
            generated_col: self.col,
            original_line: original.line,
            original_col: original.col,
        });
    }

    fn print_nodes(&mut self, nodes: &[Node]) {
        for node in nodes {
            self.print_node(node);
        }
    }

    fn print_node(&mut self, node: &Node) {
        self.map_to(node.span().start);
        match node {
            Node::Element(element) => self.print_element(element),
            Node::Text(text) => self.write(&text.value),
            Node::Comment(comment) => {
                self.write("<!--");
                self.write(&comment.value);
                self.write("-->");
            }
            Node::Let(decl) => {
                self.write("@let ");
                self.write(&decl.name);
                self.write(" = ");
                self.write(&decl.value);
                self.write(";");
            }
        }
    }

    fn print_element(&mut self, element: &Element) {
        self.write("<");
        self.write(&element.name);
        for attr in &element.attrs {
            self.write(" ");
            self.print_attribute(attr);
        }
        if element.is_self_closing {
            self.write(" />");
            return;
        }
        self.write(">");
        if element.is_void {
            return;
        }
        if is_raw_text_tag(&element.name) {
            // Raw text children were captured verbatim by the lexer.
            for child in &element.children {
                if let Node::Text(text) = child {
                    self.write(&text.value);
                }
            }
        } else {
            self.print_nodes(&element.children);
        }
        self.write("</");
        self.write(&element.name);
        self.write(">");
    }

    fn print_attribute(&mut self, attr: &Attribute) {
        self.write(&attr.name);
        if attr.value_tokens.is_none() {
            return;
        }
        self.write("=");
        match attr.quote {
            Some(q) => {
                let quote = q.to_string();
                self.write(&quote);
                self.write(&attr.value);
                self.write(&quote);
            }
            None => {
                // Brace-value or unquoted attribute.
                self.write(&attr.value);
            }
        }
    }
}
