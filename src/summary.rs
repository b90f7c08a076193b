use crate::util;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Source of prose summaries for repository paths (a folder, a file, or the
/// repository root).
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// `rel_path` is relative to the repository root; `""` is the root.
    async fn summary(&self, rel_path: &str) -> Result<Option<String>>;
}

/// In-memory summaries keyed by normalized repo-relative path.
#[derive(Debug, Clone, Default)]
pub struct StaticSummaries {
    entries: HashMap<String, String>,
}

impl StaticSummaries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rel_path: &str, summary: impl Into<String>) {
        self.entries.insert(summary_key(rel_path), summary.into());
    }

    /// Reads a JSON object mapping repo-relative paths to summary text.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("parse {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let parsed: HashMap<String, String> = serde_json::from_str(raw)?;
        let mut store = Self::new();
        for (rel_path, summary) in parsed {
            store.insert(&rel_path, summary);
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SummaryStore for StaticSummaries {
    async fn summary(&self, rel_path: &str) -> Result<Option<String>> {
        Ok(self.entries.get(&summary_key(rel_path)).cloned())
    }
}

fn summary_key(rel_path: &str) -> String {
    util::normalize_rel_path(rel_path)
}
