use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::model::{GoldenItem, RunResult};

use super::codec::import_file;

#[derive(Debug, Clone, PartialEq)]
pub struct GoldenEntry {
    pub item: GoldenItem,
    pub result: RunResult,
}

impl GoldenEntry {
    fn fresh(mut item: GoldenItem) -> Self {
        item.strip_run_fields();
        Self {
            item,
            result: RunResult::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub not_run: usize,
    pub mean_exact: Option<f64>,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct GoldenStore {
    entries: Vec<GoldenEntry>,
}

impl GoldenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<GoldenItem>) -> Self {
        let mut store = Self::new();
        store.load(items);
        store
    }

    /// Replaces the whole set; every entry starts from an unset run result.
    pub fn load(&mut self, items: Vec<GoldenItem>) {
        self.entries = items.into_iter().map(GoldenEntry::fresh).collect();
    }

    pub fn add(&mut self, id: &str, query: &str) -> bool {
        let id = id.trim();
        let query = query.trim();
        if id.is_empty() || query.is_empty() {
            return false;
        }

        self.entries.push(GoldenEntry::fresh(GoldenItem::new(id, query)));
        true
    }

    pub fn remove(&mut self, id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.item.id != id);
        before - self.entries.len()
    }

    pub fn import_file(&mut self, path: &Path) -> Result<usize> {
        let items = import_file(path)?;
        let count = items.len();
        self.load(items);
        info!(path = %path.display(), items = count, "imported golden set");
        Ok(count)
    }

    pub fn load_defaults(&mut self, path: &Path) -> usize {
        match import_file(path) {
            Ok(items) => {
                self.load(items);
                info!(path = %path.display(), items = self.len(), "loaded default golden set");
            }
            Err(err) => {
                warn!(path = %path.display(), error = %format!("{err:#}"), "default golden set unavailable");
                self.load(Vec::new());
            }
        }
        self.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GoldenEntry> {
        self.entries.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&GoldenEntry> {
        self.entries.iter().find(|entry| entry.item.id == id)
    }

    pub fn entries(&self) -> &[GoldenEntry] {
        &self.entries
    }

    pub fn items(&self) -> impl Iterator<Item = &GoldenItem> {
        self.entries.iter().map(|entry| &entry.item)
    }

    pub fn set_result(&mut self, index: usize, result: RunResult) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.result = result;
                true
            }
            None => false,
        }
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            total: self.entries.len(),
            ..RunSummary::default()
        };

        let mut exact_total = 0.0_f64;
        let mut scored = 0_usize;
        for entry in &self.entries {
            let result = &entry.result;
            if !result.has_run() {
                summary.not_run += 1;
                continue;
            }

            if result.is_error() {
                summary.errored += 1;
            }
            if result.passed() {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
            if let Some(score) = result.score.filter(|_| !result.is_error()) {
                exact_total += score.exact;
                scored += 1;
            }
            summary.total_ms += result.ms.unwrap_or(0);
        }

        if scored > 0 {
            summary.mean_exact = Some(exact_total / scored as f64);
        }

        summary
    }
}
