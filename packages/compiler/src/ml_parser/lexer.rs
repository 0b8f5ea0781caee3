//! Markup tokenizer: converts component markup source into tokens.
//!
//! The dialect is HTML-like with JSX-style single-brace interpolations
//! (`{expr}`) in text and attribute values, and `@let name = expr;`
//! declarations at markup level.

use std::sync::Arc;

use crate::chars;
use crate::parse_util::{Loc, ParseError, SourceFile, Span};

use super::tags::is_raw_text_tag;
use super::tokens::{Token, TokenType};

#[derive(Debug)]
pub struct TokenizeResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<ParseError>,
}

/// Tokenize a whole source file.
pub fn tokenize(file: Arc<SourceFile>) -> TokenizeResult {
    let mut lexer = Lexer::new(file);
    lexer.tokenize();
    TokenizeResult {
        tokens: merge_text_tokens(lexer.tokens),
        errors: lexer.errors,
    }
}

struct Lexer {
    file: Arc<SourceFile>,
    offset: usize,
    line: usize,
    col: usize,
    peek: char,
    tokens: Vec<Token>,
    errors: Vec<ParseError>,
}

impl Lexer {
    fn new(file: Arc<SourceFile>) -> Self {
        let peek = file.content.chars().next().unwrap_or(chars::EOF);
        Lexer {
            file,
            offset: 0,
            line: 0,
            col: 0,
            peek,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn loc(&self) -> Loc {
        Loc {
            offset: self.offset,
            line: self.line,
            col: self.col,
        }
    }

    fn span_from(&self, start: Loc) -> Span {
        Span::new(self.file.clone(), start, self.loc())
    }

    fn at_eof(&self) -> bool {
        self.offset >= self.file.content.len()
    }

    fn advance(&mut self) {
        if self.at_eof() {
            return;
        }
        let len = self.peek.len_utf8();
        if self.peek == chars::NEWLINE {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        self.offset += len;
        self.peek = self.file.content[self.offset..]
            .chars()
            .next()
            .unwrap_or(chars::EOF);
    }

    fn starts_with(&self, s: &str) -> bool {
        self.file.content[self.offset..].starts_with(s)
    }

    fn advance_str(&mut self, s: &str) {
        for _ in s.chars() {
            self.advance();
        }
    }

    fn text_since(&self, start: Loc) -> String {
        self.file.content[start.offset..self.offset].to_string()
    }

    fn emit(&mut self, kind: TokenType, parts: Vec<String>, start: Loc) {
        let span = self.span_from(start);
        self.tokens.push(Token::new(kind, parts, span));
    }

    fn error(&mut self, start: Loc, msg: impl Into<String>) {
        let span = self.span_from(start);
        self.errors.push(ParseError::new(span, msg));
    }

    fn tokenize(&mut self) {
        while !self.at_eof() {
            let start = self.loc();
            if self.peek == chars::LT {
                if self.starts_with("<!--") {
                    self.consume_comment(start);
                } else if self.starts_with("</") {
                    self.consume_tag_close(start);
                } else if self
                    .file
                    .content[self.offset + 1..]
                    .chars()
                    .next()
                    .is_some_and(chars::is_name_start)
                {
                    self.consume_tag_open(start);
                } else {
                    // A lone `<` is literal text.
                    self.advance();
                    self.emit(TokenType::Text, vec!["<".to_string()], start);
                }
            } else if self.peek == chars::LBRACE {
                self.consume_interpolation(start, TokenType::Interpolation, None);
            } else if self.peek == chars::AT && self.starts_with("@let") {
                self.consume_let(start);
            } else {
                self.consume_text();
            }
        }
        let start = self.loc();
        self.emit(TokenType::Eof, vec![], start);
    }

    fn consume_text(&mut self) {
        let start = self.loc();
        while !self.at_eof() {
            if self.peek == chars::LT || self.peek == chars::LBRACE {
                break;
            }
            if self.peek == chars::AT && self.starts_with("@let") {
                break;
            }
            self.advance();
        }
        let text = self.text_since(start);
        if !text.is_empty() {
            self.emit(TokenType::Text, vec![text], start);
        }
    }

    fn consume_comment(&mut self, start: Loc) {
        self.advance_str("<!--");
        let content_start = self.loc();
        loop {
            if self.at_eof() {
                self.error(start, "Unterminated comment");
                let content = self.text_since(content_start);
                self.emit(TokenType::Comment, vec![content], start);
                return;
            }
            if self.starts_with("-->") {
                break;
            }
            self.advance();
        }
        let content = self.text_since(content_start);
        self.advance_str("-->");
        self.emit(TokenType::Comment, vec![content], start);
    }

    fn consume_name(&mut self) -> String {
        let start = self.loc();
        if chars::is_name_start(self.peek) {
            self.advance();
            while chars::is_name_char(self.peek) {
                self.advance();
            }
        }
        self.text_since(start)
    }

    fn consume_tag_close(&mut self, start: Loc) {
        self.advance_str("</");
        let name = self.consume_name();
        self.skip_whitespace();
        if self.peek == chars::GT {
            self.advance();
        } else {
            self.error(start, format!("Unterminated closing tag \"{name}\""));
        }
        self.emit(TokenType::TagClose, vec![name], start);
    }

    fn consume_tag_open(&mut self, start: Loc) {
        self.advance(); // `<`
        let name = self.consume_name();
        self.emit(TokenType::TagOpenStart, vec![name.clone()], start);

        loop {
            self.skip_whitespace();
            let attr_start = self.loc();
            if self.at_eof() {
                self.error(start, format!("Unterminated opening tag \"{name}\""));
                return;
            }
            if self.peek == chars::SLASH && self.starts_with("/>") {
                self.advance_str("/>");
                self.emit(TokenType::TagOpenEndVoid, vec![], attr_start);
                return;
            }
            if self.peek == chars::GT {
                self.advance();
                self.emit(TokenType::TagOpenEnd, vec![], attr_start);
                break;
            }
            if chars::is_name_start(self.peek) {
                self.consume_attribute(attr_start);
            } else {
                // Skip a character we cannot make sense of to guarantee
                // forward progress.
                self.error(attr_start, format!("Unexpected character \"{}\"", self.peek));
                self.advance();
            }
        }

        if is_raw_text_tag(&name) {
            self.consume_raw_text(&name);
        }
    }

    fn consume_attribute(&mut self, start: Loc) {
        let attr_name = self.consume_name();
        self.emit(TokenType::AttrName, vec![attr_name], start);
        self.skip_whitespace();
        if self.peek != chars::EQ {
            return; // bare attribute
        }
        self.advance();
        self.skip_whitespace();

        if self.peek == chars::DQ || self.peek == chars::SQ {
            let quote = self.peek;
            let quote_start = self.loc();
            self.advance();
            self.emit(TokenType::AttrQuote, vec![quote.to_string()], quote_start);
            self.consume_attr_value_quoted(quote);
            let end_quote_start = self.loc();
            if self.peek == quote {
                self.advance();
                self.emit(
                    TokenType::AttrQuote,
                    vec![quote.to_string()],
                    end_quote_start,
                );
            } else {
                self.error(start, "Unterminated attribute value");
            }
        } else if self.peek == chars::LBRACE {
            let interp_start = self.loc();
            self.consume_interpolation(interp_start, TokenType::AttrValueInterpolation, None);
        } else {
            let value_start = self.loc();
            while !self.at_eof() && !chars::is_whitespace(self.peek) && self.peek != chars::GT {
                if self.peek == chars::SLASH && self.starts_with("/>") {
                    break;
                }
                self.advance();
            }
            let value = self.text_since(value_start);
            self.emit(TokenType::AttrValueText, vec![value], value_start);
        }
    }

    fn consume_attr_value_quoted(&mut self, quote: char) {
        loop {
            if self.at_eof() || self.peek == quote {
                return;
            }
            if self.peek == chars::LBRACE {
                let start = self.loc();
                self.consume_interpolation(start, TokenType::AttrValueInterpolation, Some(quote));
                continue;
            }
            let start = self.loc();
            while !self.at_eof() && self.peek != quote && self.peek != chars::LBRACE {
                self.advance();
            }
            let text = self.text_since(start);
            if !text.is_empty() {
                self.emit(TokenType::AttrValueText, vec![text], start);
            }
        }
    }

    /// Consume `{expr}` with balanced inner braces; quoted strings inside
    /// the expression may contain unbalanced braces.
    fn consume_interpolation(&mut self, start: Loc, kind: TokenType, stop_quote: Option<char>) {
        self.advance(); // `{`
        let expr_start = self.loc();
        let mut depth = 1usize;
        let mut in_quote: Option<char> = None;
        loop {
            if self.at_eof() || stop_quote.is_some_and(|q| in_quote.is_none() && self.peek == q) {
                self.error(start, "Unterminated interpolation");
                let expr = self.text_since(expr_start);
                self.emit(
                    kind,
                    vec!["{".to_string(), expr, String::new()],
                    start,
                );
                return;
            }
            match in_quote {
                Some(q) => {
                    if self.peek == chars::BACKSLASH {
                        self.advance();
                    } else if self.peek == q {
                        in_quote = None;
                    }
                }
                None => match self.peek {
                    chars::DQ | chars::SQ | '`' => in_quote = Some(self.peek),
                    chars::LBRACE => depth += 1,
                    chars::RBRACE => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                },
            }
            self.advance();
        }
        let expr = self.text_since(expr_start);
        self.advance(); // `}`
        self.emit(
            kind,
            vec!["{".to_string(), expr, "}".to_string()],
            start,
        );
    }

    fn consume_let(&mut self, start: Loc) {
        self.advance_str("@let");
        if !chars::is_whitespace(self.peek) {
            // Not actually a let declaration (`@letter` etc), re-emit as text.
            let text = self.text_since(start);
            self.emit(TokenType::Text, vec![text], start);
            return;
        }
        self.skip_whitespace();
        let name_start = self.loc();
        let name = self.consume_name();
        if name.is_empty() {
            self.error(start, "Expected a name after @let");
        }
        self.emit(TokenType::LetStart, vec![name], start);
        self.skip_whitespace();
        if self.peek == chars::EQ {
            self.advance();
            self.skip_whitespace();
        } else {
            self.error(name_start, "Expected `=` in @let declaration");
        }
        let value_start = self.loc();
        let mut in_quote: Option<char> = None;
        while !self.at_eof() {
            match in_quote {
                Some(q) => {
                    if self.peek == chars::BACKSLASH {
                        self.advance();
                    } else if self.peek == q {
                        in_quote = None;
                    }
                }
                None => {
                    if self.peek == chars::SEMICOLON {
                        break;
                    }
                    if matches!(self.peek, chars::DQ | chars::SQ | '`') {
                        in_quote = Some(self.peek);
                    }
                }
            }
            self.advance();
        }
        let value = self.text_since(value_start).trim_end().to_string();
        self.emit(TokenType::LetValue, vec![value], value_start);
        let end_start = self.loc();
        if self.peek == chars::SEMICOLON {
            self.advance();
            self.emit(TokenType::LetEnd, vec![], end_start);
        } else {
            self.error(start, "Unterminated @let declaration");
        }
    }

    fn consume_raw_text(&mut self, tag_name: &str) {
        let start = self.loc();
        let close = format!("</{tag_name}");
        while !self.at_eof() && !self.starts_with(&close) {
            self.advance();
        }
        let text = self.text_since(start);
        self.emit(TokenType::RawText, vec![text], start);
        if self.at_eof() {
            self.error(start, format!("Unterminated raw text element \"{tag_name}\""));
        }
    }

    fn skip_whitespace(&mut self) {
        while chars::is_whitespace(self.peek) && !self.at_eof() {
            self.advance();
        }
    }
}

/// Merge adjacent Text tokens produced by lexer recovery paths.
fn merge_text_tokens(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        match (out.last_mut(), token.kind) {
            (Some(prev), TokenType::Text) if prev.kind == TokenType::Text => {
                let text = format!("{}{}", prev.part(0), token.part(0));
                prev.parts = vec![text];
                prev.span.end = token.span.end;
            }
            _ => out.push(token),
        }
    }
    out
}
