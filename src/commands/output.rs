use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use crate::golden::{GoldenEntry, RunSummary};

const ID_WIDTH: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(super) struct ResultRow {
    pub id: String,
    pub query: String,
    pub exact: Option<f64>,
    pub cits_ok: Option<bool>,
    pub grounded: Option<u8>,
    pub ms: Option<u64>,
    pub pass: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
    pub citation_count: usize,
}

impl ResultRow {
    pub fn from_entry(entry: &GoldenEntry) -> Self {
        let result = &entry.result;
        let score = result.score;
        Self {
            id: entry.item.id.clone(),
            query: entry.item.query.clone(),
            exact: score.map(|score| score.exact),
            cits_ok: score.map(|score| score.cits_ok),
            grounded: score.map(|score| score.grounded),
            ms: result.ms,
            pass: result.passed(),
            error: result.is_error().then(|| result.error.clone()),
            final_answer: result.resp.as_ref().map(|resp| resp.final_answer.clone()),
            citation_count: result
                .resp
                .as_ref()
                .map(|resp| resp.citations.len())
                .unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(super) struct RunReport {
    pub report_version: u32,
    pub generated_at: String,
    pub golden_path: String,
    pub golden_sha256: Option<String>,
    pub api_url: String,
    pub cancelled: bool,
    pub summary: RunSummary,
    pub results: Vec<ResultRow>,
}

pub(super) fn write_table<W: Write>(
    output: &mut W,
    entries: &[GoldenEntry],
    summary: &RunSummary,
) -> Result<()> {
    writeln!(
        output,
        "{:<ID_WIDTH$}  {:>5}  {:>9}  {:>8}  {:>6}  {:>5}",
        "ID", "Exact", "Citations", "Grounded", "ms", "PASS"
    )?;
    writeln!(output, "{}", "-".repeat(72))?;

    for entry in entries {
        let row = ResultRow::from_entry(entry);
        writeln!(
            output,
            "{:<ID_WIDTH$}  {:>5}  {:>9}  {:>8}  {:>6}  {:>5}",
            row.id,
            row.exact
                .map(|exact| format!("{exact:.2}"))
                .unwrap_or_else(|| "-".to_string()),
            match row.cits_ok {
                Some(true) => "ok",
                Some(false) => "fail",
                None => "-",
            },
            row.grounded
                .map(|grounded| format!("{:.2}", f64::from(grounded)))
                .unwrap_or_else(|| "-".to_string()),
            row.ms
                .map(|ms| ms.to_string())
                .unwrap_or_else(|| "-".to_string()),
            row.pass,
        )?;
        if let Some(error) = &row.error {
            writeln!(output, "\terror: {error}")?;
        }
    }

    writeln!(output, "Total: {}  Fails: {}", summary.total, summary.failed)?;
    Ok(())
}
