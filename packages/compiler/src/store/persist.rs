//! Store persistence and per-resource write locks.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;

use crate::error::CompileError;

use super::schema::MetadataStore;

/// Reads and writes the persisted store under a resource key. The pipeline
/// only ever touches a store through this seam, so tests can swap in an
/// in-memory implementation.
pub trait StorePersist: Send + Sync {
    /// Load the store for a key. A missing resource is an empty store.
    fn read(&self, key: &str) -> Result<MetadataStore, CompileError>;
    fn write(&self, key: &str, store: &MetadataStore) -> Result<(), CompileError>;
}

/// Filesystem-backed persistence rooted at a project directory. Writes go
/// through a temp file and rename so a crashed build never leaves a
/// half-written store behind.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsStore { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn write_atomic(&self, path: &Path, content: &str) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)
                .with_context(|| format!("creating {}", tmp.display()))?;
            file.write_all(content.as_bytes())
                .with_context(|| format!("writing {}", tmp.display()))?;
        }
        fs::rename(&tmp, path)
            .with_context(|| format!("renaming {} into place", tmp.display()))?;
        Ok(())
    }
}

impl StorePersist for FsStore {
    fn read(&self, key: &str) -> Result<MetadataStore, CompileError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(MetadataStore::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))
            .map_err(|source| CompileError::Store {
                key: key.to_string(),
                source,
            })?;
        serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))
            .map_err(|source| CompileError::Store {
                key: key.to_string(),
                source,
            })
    }

    fn write(&self, key: &str, store: &MetadataStore) -> Result<(), CompileError> {
        let path = self.path_for(key);
        let content = serde_json::to_string_pretty(store)
            .context("serializing metadata store")
            .map_err(|source| CompileError::Store {
                key: key.to_string(),
                source,
            })?;
        self.write_atomic(&path, &content)
            .map_err(|source| CompileError::Store {
                key: key.to_string(),
                source,
            })
    }
}

/// In-memory persistence for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    stores: Mutex<HashMap<String, MetadataStore>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn snapshot(&self, key: &str) -> Option<MetadataStore> {
        match self.stores.lock() {
            Ok(stores) => stores.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }
}

impl StorePersist for MemoryStore {
    fn read(&self, key: &str) -> Result<MetadataStore, CompileError> {
        Ok(self.snapshot(key).unwrap_or_default())
    }

    fn write(&self, key: &str, store: &MetadataStore) -> Result<(), CompileError> {
        let mut stores = match self.stores.lock() {
            Ok(stores) => stores,
            Err(poisoned) => poisoned.into_inner(),
        };
        stores.insert(key.to_string(), store.clone());
        Ok(())
    }
}

/// One mutex per resource key. Commits against the same key serialize;
/// distinct keys proceed in parallel.
#[derive(Default)]
pub struct ResourceLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ResourceLocks {
    pub fn new() -> Self {
        ResourceLocks::default()
    }

    pub fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
