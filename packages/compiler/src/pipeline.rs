//! Pipeline orchestration: parse, rewrite, reconcile, persist.
//!
//! Files are processed in parallel; commits against the same resource key
//! serialize on a per-key lock, so two files that share a store never race
//! their read-modify-write cycles.

use std::collections::HashSet;

use chrono::Utc;
use rayon::prelude::*;

use crate::config::CompilerConfig;
use crate::error::{CompileError, Diagnostic, Severity};
use crate::i18n::rewrite::rewrite_file;
use crate::i18n::unit::IdentifiedUnit;
use crate::ml_parser::serializer::{serialize, SourceMap};
use crate::ml_parser::Parser;
use crate::parse_util::ParseErrorLevel;
use crate::store::{reconcile, FsStore, ResourceLocks, StorePersist};

/// One source file handed to a build.
#[derive(Debug, Clone)]
pub struct SourceInput {
    pub path: String,
    pub source: String,
}

/// The per-file result: rewritten output (or the input passed through),
/// plus everything the caller needs to report.
#[derive(Debug)]
pub struct FileOutput {
    pub path: String,
    pub output: String,
    pub source_map: Option<SourceMap>,
    pub unit_count: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub changed: bool,
}

#[derive(Debug)]
pub struct BuildReport {
    pub files: Vec<FileOutput>,
    pub total_units: usize,
}

pub struct Compiler<P: StorePersist> {
    config: CompilerConfig,
    persist: P,
    locks: ResourceLocks,
}

impl Compiler<FsStore> {
    /// A compiler persisting stores on disk under `root`.
    pub fn with_fs_store(config: CompilerConfig, root: impl Into<std::path::PathBuf>) -> Self {
        Compiler::new(config, FsStore::new(root))
    }
}

impl<P: StorePersist> Compiler<P> {
    pub fn new(config: CompilerConfig, persist: P) -> Self {
        Compiler {
            config,
            persist,
            locks: ResourceLocks::new(),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn persist(&self) -> &P {
        &self.persist
    }

    /// Compile one file and commit its units to the store.
    ///
    /// Parse failures and store I/O problems degrade to diagnostics on the
    /// returned output; only an identifier collision is fatal.
    pub fn process_file(&self, path: &str, source: &str) -> Result<FileOutput, CompileError> {
        log::debug!("processing {path}");
        let parse = Parser::new().parse(source, path);

        let mut diagnostics: Vec<Diagnostic> = parse
            .errors
            .iter()
            .map(Diagnostic::from_parse_error)
            .collect();

        let has_parse_errors = parse
            .errors
            .iter()
            .any(|e| e.level == ParseErrorLevel::Error);
        if has_parse_errors {
            // Pass the file through untouched; the build goes on.
            log::warn!("{path}: parse errors, passing source through unmodified");
            return Ok(FileOutput {
                path: path.to_string(),
                output: source.to_string(),
                source_map: None,
                unit_count: 0,
                diagnostics,
                changed: false,
            });
        }

        let outcome = rewrite_file(parse, &self.config);
        diagnostics.extend(outcome.diagnostics.iter().map(Diagnostic::from_parse_error));

        let (output, source_map) = if outcome.changed {
            let (output, map) = serialize(&outcome.nodes, path);
            (output, Some(map))
        } else {
            (source.to_string(), None)
        };

        if let Err(error) = self.commit(path, &outcome.units, &outcome.retained_ids) {
            match error {
                CompileError::IdentifierCollision { .. } => return Err(error),
                other => {
                    log::error!("{path}: {other}");
                    diagnostics.push(Diagnostic {
                        severity: Severity::Error,
                        message: other.to_string(),
                        file: path.to_string(),
                        location: None,
                    });
                }
            }
        }

        Ok(FileOutput {
            path: path.to_string(),
            output,
            source_map,
            unit_count: outcome.units.len(),
            diagnostics,
            changed: outcome.changed,
        })
    }

    /// Locked read-modify-write of the store a file commits into.
    fn commit(
        &self,
        path: &str,
        units: &[IdentifiedUnit],
        retained_ids: &[String],
    ) -> Result<(), CompileError> {
        let key = self.config.resource_key(path);
        let lock = self.locks.lock_for(&key);
        let _guard = match lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut store = self.persist.read(&key)?;
        if units.is_empty() && retained_ids.is_empty() && !store.files.contains_key(path) {
            // The file never contributed entries and still does not.
            return Ok(());
        }
        reconcile::upsert_file(&mut store, path, units, retained_ids, Utc::now())?;
        log::debug!("committed {} units from {path} to {key}", units.len());
        self.persist.write(&key, &store)
    }

    /// Compile a whole source tree. Files run in parallel; the build fails
    /// as a unit on the first identifier collision.
    pub fn process_build(&self, inputs: &[SourceInput]) -> Result<BuildReport, CompileError> {
        let results: Vec<Result<FileOutput, CompileError>> = inputs
            .par_iter()
            .map(|input| self.process_file(&input.path, &input.source))
            .collect();

        let mut files = Vec::with_capacity(results.len());
        for result in results {
            files.push(result?);
        }

        self.finish_build(inputs)?;

        let total_units = files.iter().map(|f| f.unit_count).sum();
        Ok(BuildReport { files, total_units })
    }

    /// Age stale entries and run the configured GC sweep, once per touched
    /// resource key.
    fn finish_build(&self, inputs: &[SourceInput]) -> Result<(), CompileError> {
        let keys: HashSet<String> = inputs
            .iter()
            .map(|input| self.config.resource_key(&input.path))
            .collect();
        for key in keys {
            let lock = self.locks.lock_for(&key);
            let _guard = match lock.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let mut store = self.persist.read(&key)?;
            if store.entries.is_empty() && store.files.is_empty() {
                continue;
            }
            reconcile::sweep(&mut store, self.config.gc_after_builds, Utc::now());
            self.persist.write(&key, &store)?;
        }
        Ok(())
    }
}
