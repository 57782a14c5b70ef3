//! Permanent advisory dismissals
//!
//! The engine only computes content hashes; where they live is up to the
//! host. Records are keyed by `(document_id, content_hash)`.

use crate::util::write_atomic;
use anyhow::Context;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait DismissalStore: Send + Sync {
    fn load(&self, document_id: &str) -> anyhow::Result<HashSet<String>>;
    fn record(&self, document_id: &str, content_hash: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryDismissals {
    records: Mutex<HashMap<String, HashSet<String>>>,
}

impl MemoryDismissals {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DismissalStore for MemoryDismissals {
    fn load(&self, document_id: &str) -> anyhow::Result<HashSet<String>> {
        let records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("dismissal store lock poisoned"))?;
        Ok(records.get(document_id).cloned().unwrap_or_default())
    }

    fn record(&self, document_id: &str, content_hash: &str) -> anyhow::Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("dismissal store lock poisoned"))?;
        records
            .entry(document_id.to_string())
            .or_default()
            .insert(content_hash.to_string());
        Ok(())
    }
}

/// All documents' dismissals in one JSON file: `{ "doc-id": ["hash", ...] }`.
#[derive(Debug)]
pub struct FileDismissals {
    path: PathBuf,
    write_guard: Mutex<()>,
}

impl FileDismissals {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> anyhow::Result<BTreeMap<String, BTreeSet<String>>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("corrupt dismissal file {}", self.path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

impl DismissalStore for FileDismissals {
    fn load(&self, document_id: &str) -> anyhow::Result<HashSet<String>> {
        Ok(self
            .read_all()?
            .remove(document_id)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default())
    }

    fn record(&self, document_id: &str, content_hash: &str) -> anyhow::Result<()> {
        let _guard = self
            .write_guard
            .lock()
            .map_err(|_| anyhow::anyhow!("dismissal store lock poisoned"))?;
        let mut all = self.read_all()?;
        let inserted = all
            .entry(document_id.to_string())
            .or_default()
            .insert(content_hash.to_string());
        if !inserted {
            return Ok(());
        }
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        write_atomic(&self.path, &serde_json::to_string_pretty(&all)?)
    }
}
