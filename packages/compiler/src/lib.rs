#![deny(clippy::all)]

//! Build-time i18n compiler for component markup files.
//!
//! The pipeline parses each file, classifies and assembles its translatable
//! content into units, derives a stable 12-character identifier per unit,
//! rewrites the tree to runtime lookup calls, and reconciles everything
//! into a persisted metadata store.

pub mod chars;
pub mod config;
pub mod error;
pub mod i18n;
pub mod ml_parser;
pub mod parse_util;
pub mod pipeline;
pub mod store;

pub use config::CompilerConfig;
pub use error::{CompileError, Diagnostic, Severity};
pub use pipeline::{BuildReport, Compiler, FileOutput, SourceInput};
