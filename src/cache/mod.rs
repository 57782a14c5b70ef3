//! Rewrite cache
//!
//! Content-addressed storage for remote rewrites: the key is a hash of the
//! category and the source text, so identical text never triggers a second
//! remote call within the TTL window.
//!
//! # Error Handling
//!
//! The cache is best-effort. A failed write triggers one eviction sweep and
//! one retry; a second failure is logged and swallowed. Reads that fail are
//! treated as misses. Nothing here ever blocks the suggestion flow.

use crate::suggest::Category;
use crate::util::{hash_str, write_atomic};
use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration as StdDuration, Instant};

/// Every cache key starts with this, so `clear` can leave foreign keys alone.
pub const KEY_PREFIX: &str = "wordwise_rewrite_";

const DEFAULT_TTL_MINUTES: i64 = 30;
const CACHE_LOCK_TIMEOUT_SECS: u64 = 5;
const CACHE_LOCK_RETRY_MS: u64 = 50;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage payload invalid: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Key-value backend for the cache. Shared between tasks, so `&self`.
pub trait CacheStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// In-memory storage with an optional byte quota (keys plus values).
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Io(std::io::Error::new(ErrorKind::Other, "storage lock poisoned")))
    }
}

impl CacheStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries()?;
        if let Some(quota) = self.quota_bytes {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries()?.keys().cloned().collect())
    }
}

/// A JSON object on disk, guarded by an advisory file lock.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

struct StorageLock {
    file: std::fs::File,
}

impl Drop for StorageLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<cache_dir>/wordwise/rewrites.json`
    pub fn default_location() -> Option<Self> {
        dirs::cache_dir().map(|dir| Self::new(dir.join("wordwise").join("rewrites.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<StorageLock, StorageError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.path.with_extension("lock"))?;

        let start = Instant::now();
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(StorageLock { file }),
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if start.elapsed() >= StdDuration::from_secs(CACHE_LOCK_TIMEOUT_SECS) {
                        return Err(StorageError::Io(std::io::Error::new(
                            ErrorKind::TimedOut,
                            "timed out waiting for cache lock",
                        )));
                    }
                    std::thread::sleep(StdDuration::from_millis(CACHE_LOCK_RETRY_MS));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn read_map(&self) -> Result<HashMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        let content = serde_json::to_string(map)?;
        write_atomic(&self.path, &content).map_err(|e| {
            StorageError::Io(std::io::Error::new(ErrorKind::Other, e.to_string()))
        })
    }
}

impl CacheStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _lock = self.lock()?;
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _lock = self.lock()?;
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _lock = self.lock()?;
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let _lock = self.lock()?;
        Ok(self.read_map()?.into_keys().collect())
    }
}

/// A stored rewrite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Source of "now", injectable for tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
pub struct RewriteCache {
    storage: Arc<dyn CacheStorage>,
    ttl: Duration,
    clock: Clock,
}

impl std::fmt::Debug for RewriteCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteCache").field("ttl", &self.ttl).finish()
    }
}

impl RewriteCache {
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self {
            storage,
            ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn key(category: Category, source_text: &str) -> String {
        format!("{}{}_{}", KEY_PREFIX, category.key(), hash_str(source_text))
    }

    /// Cached rewrite if present and unexpired. Expired entries are removed.
    pub fn get(&self, category: Category, source_text: &str) -> Option<String> {
        let key = Self::key(category, source_text);
        let raw = match self.storage.get(&key) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::debug!(error = %err, "rewrite cache read failed; treating as miss");
                return None;
            }
        };
        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) if entry.expires_at > (self.clock)() => Some(entry.value),
            _ => {
                let _ = self.storage.remove(&key);
                None
            }
        }
    }

    /// Store a rewrite with a fresh expiry. Never fails.
    pub fn set(&self, category: Category, source_text: &str, value: &str) {
        let key = Self::key(category, source_text);
        let entry = CacheEntry {
            value: value.to_string(),
            expires_at: (self.clock)() + self.ttl,
        };
        let Ok(payload) = serde_json::to_string(&entry) else {
            return;
        };

        if let Err(first) = self.storage.set(&key, &payload) {
            let evicted = self.sweep();
            tracing::debug!(error = %first, evicted, "rewrite cache write failed; retrying after sweep");
            if let Err(err) = self.storage.set(&key, &payload) {
                tracing::warn!(error = %err, category = %category, "rewrite cache write dropped");
            }
        }
    }

    /// Remove expired or unreadable entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = (self.clock)();
        self.prefixed_keys()
            .into_iter()
            .filter(|key| {
                let expired = match self.storage.get(key) {
                    Ok(Some(raw)) => serde_json::from_str::<CacheEntry>(&raw)
                        .map(|entry| entry.expires_at <= now)
                        .unwrap_or(true),
                    Ok(None) => false,
                    Err(_) => false,
                };
                expired && self.storage.remove(key).is_ok()
            })
            .count()
    }

    /// Remove every rewrite entry. Returns how many were removed.
    pub fn clear(&self) -> usize {
        self.prefixed_keys()
            .into_iter()
            .filter(|key| self.storage.remove(key).is_ok())
            .count()
    }

    fn prefixed_keys(&self) -> Vec<String> {
        self.storage
            .keys()
            .unwrap_or_default()
            .into_iter()
            .filter(|key| key.starts_with(KEY_PREFIX))
            .collect()
    }
}
