use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ScoreArgs;
use crate::golden::{GoldenStore, score};
use crate::model::{AnswerResponse, GoldenItem, RunResult};

use super::output::{ResultRow, write_table};

pub fn run(args: ScoreArgs) -> Result<bool> {
    let mut golden = GoldenStore::new();
    golden.import_file(&args.golden)?;

    let item = golden
        .find(&args.id)
        .map(|entry| entry.item.clone())
        .with_context(|| {
            format!(
                "no golden item with id {} in {}",
                args.id,
                args.golden.display()
            )
        })?;

    let raw = fs::read(&args.response)
        .with_context(|| format!("failed to read {}", args.response.display()))?;
    let response: AnswerResponse = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", args.response.display()))?;

    let scored = score_recorded(item, response);
    let summary = scored.summary();
    let entries = scored.entries();
    let row = ResultRow::from_entry(&entries[0]);
    info!(id = %row.id, pass = row.pass, "scored recorded response");

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &row).context("failed to serialize score")?;
        writeln!(output)?;
    } else {
        write_table(&mut output, entries, &summary)?;
    }
    output.flush()?;

    Ok(row.pass)
}

/// One-item store holding the score of a response captured earlier.
pub(super) fn score_recorded(item: GoldenItem, response: AnswerResponse) -> GoldenStore {
    let scored = score(&response, item.expects.as_ref());
    let mut store = GoldenStore::from_items(vec![item]);
    store.set_result(
        0,
        RunResult {
            running: false,
            ms: None,
            resp: Some(response),
            score: Some(scored),
            pass: Some(scored.passes()),
            error: String::new(),
        },
    );
    store
}
