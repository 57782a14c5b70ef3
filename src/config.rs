//! Configuration management for the engine
//!
//! Stored in ~/.config/wordwise/config.json. Every field has a default, so a
//! partial or missing file is fine; a corrupt one is backed up and ignored.

use crate::suggest::llm::models::DEFAULT_MODEL;
use crate::suggest::Category;
use crate::util::write_atomic;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Debounce window per category, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceWindows {
    pub spelling: u64,
    pub grammar: u64,
    pub clarity: u64,
    pub conciseness: u64,
    pub readability: u64,
    pub passive: u64,
    pub advisory: u64,
}

impl Default for DebounceWindows {
    fn default() -> Self {
        Self {
            spelling: 1500,
            grammar: 500,
            clarity: 500,
            conciseness: 500,
            readability: 500,
            passive: 500,
            advisory: 2000,
        }
    }
}

impl DebounceWindows {
    pub fn for_category(&self, category: Category) -> Duration {
        let ms = match category {
            Category::Spelling => self.spelling,
            Category::Grammar => self.grammar,
            Category::Clarity => self.clarity,
            Category::Conciseness => self.conciseness,
            Category::Readability => self.readability,
            Category::Passive => self.passive,
            Category::Advisory => self.advisory,
        };
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub debounce_ms: DebounceWindows,
    /// Bounded wait for a remote analyzer run before it resolves to empty
    pub remote_timeout_ms: u64,
    /// A pending rewrite older than this is re-requested when its panel reopens
    pub rewrite_timeout_ms: u64,
    pub rewrite_cache_ttl_minutes: i64,
    pub advisory_min_anchor_chars: usize,
    /// No advisory run for documents shorter than this
    pub advisory_min_content_chars: usize,
    /// Advisory is re-dispatched only when word similarity to the last
    /// dispatched text falls below this
    pub advisory_refresh_similarity: f64,
    /// Custom words never flagged as misspelled (case-insensitive)
    pub spelling_allow_list: Vec<String>,
    pub limit_spelling_suggestions: bool,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DebounceWindows::default(),
            remote_timeout_ms: 20_000,
            rewrite_timeout_ms: 20_000,
            rewrite_cache_ttl_minutes: 30,
            advisory_min_anchor_chars: 20,
            advisory_min_content_chars: 50,
            advisory_refresh_similarity: 0.85,
            spelling_allow_list: Vec::new(),
            limit_spelling_suggestions: false,
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
        }
    }
}

impl EngineConfig {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("wordwise"))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk, or return default
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                preserve_corrupt_config(path, &content);
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "config file was corrupted; backup saved and defaults loaded"
                );
                Self::default()
            }
        }
    }

    /// Save config to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path().context("could not determine config directory")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("failed to serialize config")?;
        write_atomic(path, &content).with_context(|| format!("failed to write {}", path.display()))
    }

    /// API key from `WORDWISE_API_KEY`, then `OPENROUTER_API_KEY`, then the file.
    pub fn resolve_api_key(&self) -> Option<String> {
        ["WORDWISE_API_KEY", "OPENROUTER_API_KEY"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .chain(self.api_key.clone())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
    }

    pub fn is_allowed_word(&self, word: &str) -> bool {
        self.spelling_allow_list
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(word) || allowed.to_lowercase() == word.to_lowercase())
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn rewrite_timeout(&self) -> Duration {
        Duration::from_millis(self.rewrite_timeout_ms)
    }
}

fn preserve_corrupt_config(path: &Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}
