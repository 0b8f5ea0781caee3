//! Extraction, identification and rewriting of translatable content.

pub mod assemble;
pub mod classify;
pub mod digest;
pub mod fields;
pub mod rewrite;
pub mod unit;

pub use rewrite::{rewrite_file, RewriteOutcome};
pub use unit::{IdentifiedUnit, TranslatableUnit, UnitKind};
