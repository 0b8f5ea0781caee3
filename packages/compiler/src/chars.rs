//! Character constants and predicates used by the markup lexer.

#![allow(dead_code)]

pub const EOF: char = '\0';
pub const TAB: char = '\t';
pub const NEWLINE: char = '\n';
pub const RETURN: char = '\r';
pub const SPACE: char = ' ';

pub const BANG: char = '!';
pub const DQ: char = '"';
pub const SQ: char = '\'';
pub const SLASH: char = '/';
pub const BACKSLASH: char = '\\';
pub const LT: char = '<';
pub const EQ: char = '=';
pub const GT: char = '>';
pub const AT: char = '@';
pub const MINUS: char = '-';
pub const SEMICOLON: char = ';';
pub const LBRACE: char = '{';
pub const RBRACE: char = '}';

pub fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{000C}')
}

/// First character of a tag or attribute name.
pub fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Subsequent characters of a tag or attribute name.
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}
