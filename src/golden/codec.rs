use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::model::GoldenItem;
use crate::util::unix_millis;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ImportFormat {
    Array,
    Lines,
}

impl ImportFormat {
    pub fn from_path(path: &Path) -> Self {
        let is_lines = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson"))
            .unwrap_or(false);

        if is_lines { Self::Lines } else { Self::Array }
    }
}

pub fn import_file(path: &Path) -> Result<Vec<GoldenItem>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read golden set: {}", path.display()))?;

    parse_golden_set(&text, ImportFormat::from_path(path))
        .with_context(|| format!("failed to parse golden set: {}", path.display()))
}

/// Every record must parse before anything is returned; there is no partial import.
pub fn parse_golden_set(text: &str, format: ImportFormat) -> Result<Vec<GoldenItem>> {
    let mut items = match format {
        ImportFormat::Array => {
            let parsed: Option<Vec<GoldenItem>> =
                serde_json::from_str(text).context("invalid golden set JSON array")?;
            parsed.unwrap_or_default()
        }
        ImportFormat::Lines => parse_lines(text)?,
    };

    for item in &mut items {
        item.strip_run_fields();
    }

    Ok(items)
}

fn parse_lines(text: &str) -> Result<Vec<GoldenItem>> {
    let mut items = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let item: GoldenItem = serde_json::from_str(line)
            .with_context(|| format!("invalid golden record on line {}", index + 1))?;
        items.push(item);
    }

    Ok(items)
}

/// Pretty-printed JSON array holding only the durable item fields.
pub fn export_golden_set<'a, I>(items: I) -> Result<String>
where
    I: IntoIterator<Item = &'a GoldenItem>,
{
    let durable = durable_items(items);
    let mut text =
        serde_json::to_string_pretty(&durable).context("failed to serialize golden set")?;
    text.push('\n');
    Ok(text)
}

pub fn export_golden_lines<'a, I>(items: I) -> Result<String>
where
    I: IntoIterator<Item = &'a GoldenItem>,
{
    let mut text = String::new();
    for item in durable_items(items) {
        let line = serde_json::to_string(&item)
            .with_context(|| format!("failed to serialize golden item {}", item.id))?;
        text.push_str(&line);
        text.push('\n');
    }
    Ok(text)
}

pub fn export_file_name(now: DateTime<Utc>, extension: &str) -> String {
    format!("golden-{}.{extension}", unix_millis(now))
}

fn durable_items<'a, I>(items: I) -> Vec<GoldenItem>
where
    I: IntoIterator<Item = &'a GoldenItem>,
{
    items
        .into_iter()
        .map(|item| {
            let mut item = item.clone();
            item.strip_run_fields();
            item
        })
        .collect()
}
