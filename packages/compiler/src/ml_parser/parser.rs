//! Tree builder: turns the token stream into a markup AST.
//!
//! Recovery is best-effort: mismatched or missing closing tags produce
//! parse errors but never panic, and the builder always yields a tree for
//! whatever it could make sense of.

use std::sync::Arc;

use crate::parse_util::{Loc, ParseError, SourceFile, Span};

use super::ast::{Attribute, Comment, Element, LetDeclaration, Node, Text};
use super::lexer::tokenize;
use super::tags::is_void_tag;
use super::tokens::{Token, TokenType};

#[derive(Debug)]
pub struct ParseResult {
    pub root_nodes: Vec<Node>,
    pub errors: Vec<ParseError>,
    pub file: Arc<SourceFile>,
}

#[derive(Debug, Default)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Parser
    }

    pub fn parse(&self, source: &str, url: &str) -> ParseResult {
        let file = SourceFile::new(url, source);
        let lexed = tokenize(file.clone());
        let mut builder = TreeBuilder {
            tokens: lexed.tokens,
            index: 0,
            stack: Vec::new(),
            root_nodes: Vec::new(),
            errors: lexed.errors,
            file: file.clone(),
        };
        builder.build();
        ParseResult {
            root_nodes: builder.root_nodes,
            errors: builder.errors,
            file,
        }
    }
}

struct PendingElement {
    name: String,
    attrs: Vec<Attribute>,
    children: Vec<Node>,
    start: Loc,
    start_span: Span,
}

struct TreeBuilder {
    tokens: Vec<Token>,
    index: usize,
    stack: Vec<PendingElement>,
    root_nodes: Vec<Node>,
    errors: Vec<ParseError>,
    file: Arc<SourceFile>,
}

impl TreeBuilder {
    fn peek(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.index].clone();
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        token
    }

    fn build(&mut self) {
        loop {
            match self.peek().kind {
                TokenType::Eof => break,
                TokenType::TagOpenStart => self.consume_element_start(),
                TokenType::TagClose => self.consume_element_close(),
                TokenType::Text | TokenType::Interpolation => self.consume_text(),
                TokenType::RawText => self.consume_raw_text(),
                TokenType::Comment => self.consume_comment(),
                TokenType::LetStart => self.consume_let(),
                _ => {
                    // Stray token from a lexer recovery path.
                    let token = self.advance();
                    self.errors.push(ParseError::new(
                        token.span,
                        format!("Unexpected token {:?}", token.kind),
                    ));
                }
            }
        }
        self.close_dangling_elements();
    }

    fn add_node(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root_nodes.push(node),
        }
    }

    fn consume_element_start(&mut self) {
        let open = self.advance();
        let name = open.part(0).to_string();
        let start = open.span.start;
        let mut attrs = Vec::new();

        while self.peek().kind == TokenType::AttrName {
            attrs.push(self.consume_attribute());
        }

        let (self_closing, open_end) = match self.peek().kind {
            TokenType::TagOpenEndVoid => (true, self.advance()),
            TokenType::TagOpenEnd => (false, self.advance()),
            _ => {
                // Lexer reported the unterminated tag already; synthesize
                // an end so the element still exists in the tree.
                (true, open.clone())
            }
        };

        let start_span = Span::new(self.file.clone(), start, open_end.span.end);
        let pending = PendingElement {
            name: name.clone(),
            attrs,
            children: Vec::new(),
            start,
            start_span,
        };

        if self_closing || is_void_tag(&name) {
            let node = self.finish_element(pending, self_closing, open_end.span.end);
            self.add_node(node);
        } else {
            self.stack.push(pending);
        }
    }

    fn consume_attribute(&mut self) -> Attribute {
        let name_token = self.advance();
        let name = name_token.part(0).to_string();
        let mut value = String::new();
        let mut value_tokens: Option<Vec<Token>> = None;
        let mut quote = None;
        let mut end = name_token.span.end;

        match self.peek().kind {
            TokenType::AttrQuote => {
                quote = self.advance().part(0).chars().next();
                let mut tokens = Vec::new();
                loop {
                    match self.peek().kind {
                        TokenType::AttrValueText => {
                            let t = self.advance();
                            value.push_str(t.part(0));
                            tokens.push(t);
                        }
                        TokenType::AttrValueInterpolation => {
                            let t = self.advance();
                            value.push_str(&format!("{{{}}}", t.part(1)));
                            tokens.push(t);
                        }
                        TokenType::AttrQuote => {
                            end = self.advance().span.end;
                            break;
                        }
                        _ => break,
                    }
                }
                // An empty quoted value still counts as a literal value.
                if tokens.is_empty() {
                    let span = Span::new(self.file.clone(), end, end);
                    tokens.push(Token::new(
                        TokenType::AttrValueText,
                        vec![String::new()],
                        span,
                    ));
                }
                value_tokens = Some(tokens);
            }
            TokenType::AttrValueText => {
                let t = self.advance();
                value.push_str(t.part(0));
                end = t.span.end;
                value_tokens = Some(vec![t]);
            }
            TokenType::AttrValueInterpolation => {
                let t = self.advance();
                value.push_str(&format!("{{{}}}", t.part(1)));
                end = t.span.end;
                value_tokens = Some(vec![t]);
            }
            _ => {}
        }

        Attribute {
            name,
            value,
            value_tokens,
            quote,
            span: Span::new(self.file.clone(), name_token.span.start, end),
        }
    }

    fn consume_element_close(&mut self) {
        let close = self.advance();
        let name = close.part(0).to_string();

        let matches_open = self.stack.iter().rposition(|p| p.name == name);
        match matches_open {
            Some(pos) => {
                // Implicitly close any unclosed children first.
                while self.stack.len() > pos + 1 {
                    if let Some(pending) = self.stack.pop() {
                        self.errors.push(ParseError::new(
                            pending.start_span.clone(),
                            format!("Unclosed element \"{}\"", pending.name),
                        ));
                        let node = self.finish_element(pending, false, close.span.start);
                        self.add_node(node);
                    }
                }
                if let Some(pending) = self.stack.pop() {
                    let node = self.finish_element(pending, false, close.span.end);
                    self.add_node(node);
                }
            }
            None => {
                self.errors.push(ParseError::new(
                    close.span,
                    format!("Unexpected closing tag \"{name}\""),
                ));
            }
        }
    }

    fn finish_element(&self, pending: PendingElement, self_closing: bool, end: Loc) -> Node {
        let is_void = is_void_tag(&pending.name);
        Node::Element(Element {
            name: pending.name,
            attrs: pending.attrs,
            children: pending.children,
            is_self_closing: self_closing,
            is_void,
            span: Span::new(self.file.clone(), pending.start, end),
            start_span: pending.start_span,
        })
    }

    fn consume_text(&mut self) {
        let first = self.advance();
        let start = first.span.start;
        let mut end = first.span.end;
        let mut value = raw_text(&first);
        let mut tokens = vec![first];
        while matches!(self.peek().kind, TokenType::Text | TokenType::Interpolation) {
            let token = self.advance();
            value.push_str(&raw_text(&token));
            end = token.span.end;
            tokens.push(token);
        }
        self.add_node(Node::Text(Text {
            value,
            tokens,
            span: Span::new(self.file.clone(), start, end),
        }));
    }

    fn consume_raw_text(&mut self) {
        let token = self.advance();
        self.add_node(Node::Text(Text {
            value: token.part(0).to_string(),
            span: token.span.clone(),
            tokens: vec![token],
        }));
    }

    fn consume_comment(&mut self) {
        let token = self.advance();
        self.add_node(Node::Comment(Comment {
            value: token.part(0).to_string(),
            span: token.span,
        }));
    }

    fn consume_let(&mut self) {
        let start_token = self.advance();
        let name = start_token.part(0).to_string();
        let mut value = String::new();
        let mut end = start_token.span.end;
        if self.peek().kind == TokenType::LetValue {
            let t = self.advance();
            value = t.part(0).to_string();
            end = t.span.end;
        }
        if self.peek().kind == TokenType::LetEnd {
            end = self.advance().span.end;
        }
        self.add_node(Node::Let(LetDeclaration {
            name,
            value,
            span: Span::new(self.file.clone(), start_token.span.start, end),
        }));
    }

    fn close_dangling_elements(&mut self) {
        while let Some(pending) = self.stack.pop() {
            self.errors.push(ParseError::new(
                pending.start_span.clone(),
                format!("Unclosed element \"{}\"", pending.name),
            ));
            let end = pending
                .children
                .last()
                .map(|n| n.span().end)
                .unwrap_or(pending.start_span.end);
            let node = self.finish_element(pending, false, end);
            self.add_node(node);
        }
    }
}

/// Reconstruct the raw source form of a text-position token.
fn raw_text(token: &Token) -> String {
    match token.kind {
        TokenType::Interpolation => format!("{{{}}}", token.part(1)),
        _ => token.part(0).to_string(),
    }
}
