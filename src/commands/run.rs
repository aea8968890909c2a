use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::{DEFAULT_GOLDEN_PATH, RunArgs};
use crate::golden::{GoldenStore, Orchestrator, RunEvent};
use crate::service::HttpAnswerService;
use crate::util::{now_utc_string, sha256_hex, write_json_pretty};

use super::output::{ResultRow, RunReport, write_table};

pub fn run(args: RunArgs) -> Result<bool> {
    let mut store = GoldenStore::new();
    let golden_path = match &args.golden {
        Some(path) => {
            store.import_file(path)?;
            path.clone()
        }
        None => {
            let path = PathBuf::from(DEFAULT_GOLDEN_PATH);
            store.load_defaults(&path);
            path
        }
    };
    let golden_sha256 = fs::read(&golden_path).ok().map(|raw| sha256_hex(&raw));

    let service = HttpAnswerService::new(
        &args.service.api,
        Duration::from_secs(args.service.timeout_secs),
    )?;
    info!(
        url = %service.run_url(),
        golden = %golden_path.display(),
        items = store.len(),
        "golden run requested"
    );

    if store.is_empty() {
        warn!(golden = %golden_path.display(), "golden set is empty; nothing to run");
    }

    let mut orchestrator = Orchestrator::new(Arc::new(service));
    let cancel = orchestrator.cancel_token();
    let total = store.len();
    let fail_fast = args.fail_fast;

    let cancelled = match &args.id {
        Some(id) => {
            let index = store
                .entries()
                .iter()
                .position(|entry| entry.item.id == *id)
                .with_context(|| format!("no golden item with id {id}"))?;
            orchestrator.run_one(&mut store, index);
            false
        }
        None => {
            orchestrator
                .run_all(&mut store, |event, _| match event {
                    RunEvent::Started { index, id } => {
                        info!(item = index + 1, total, id = %id, "running golden item");
                    }
                    RunEvent::Finished { id, result, .. } => {
                        if fail_fast && !result.passed() {
                            warn!(id = %id, "golden item did not pass; skipping remaining items");
                            cancel.cancel();
                        }
                    }
                    RunEvent::Done { .. } => {}
                })
                .cancelled
        }
    };
    debug!(
        phase = ?orchestrator.phase(),
        results_ready = orchestrator.results_ready(),
        cancelled,
        "orchestrator settled"
    );

    let summary = store.summary();
    let rows = store
        .entries()
        .iter()
        .map(ResultRow::from_entry)
        .collect::<Vec<_>>();

    let report = RunReport {
        report_version: 1,
        generated_at: now_utc_string(),
        golden_path: golden_path.display().to_string(),
        golden_sha256,
        api_url: args.service.api.clone(),
        cancelled,
        summary: summary.clone(),
        results: rows,
    };

    if let Some(report_path) = &args.report_path {
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote run report");
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &report)
            .context("failed to serialize run report")?;
        writeln!(output)?;
    } else {
        write_table(&mut output, store.entries(), &summary)?;
    }
    output.flush()?;

    info!(
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        errored = summary.errored,
        not_run = summary.not_run,
        "golden run complete"
    );

    Ok(summary.failed == 0)
}
