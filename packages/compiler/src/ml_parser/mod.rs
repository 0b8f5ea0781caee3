//! Lexer, parser and serializer for component markup files.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod serializer;
pub mod tags;
pub mod tokens;

pub use parser::{ParseResult, Parser};
pub use serializer::{element_to_string, serialize, SourceMap};
