use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::info;

use crate::cli::{AskArgs, AskMode};
use crate::model::{AnswerResponse, Citation};
use crate::service::{AnswerService, HttpAnswerService, RunOptions};

pub fn run(args: AskArgs) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        bail!("enter a question first");
    }

    let service = HttpAnswerService::new(
        &args.service.api,
        Duration::from_secs(args.service.timeout_secs),
    )?;

    let started = Instant::now();
    let response = service.run(query, &ask_options(args.mode))?;
    info!(
        mode = args.mode.as_str(),
        thread_id = %response.thread_id,
        citations = response.citations.len(),
        steps = response.steps.len(),
        ms = started.elapsed().as_millis() as u64,
        "answer received"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &response)
            .context("failed to serialize answer json output")?;
        writeln!(output)?;
    } else {
        write_answer(&mut output, &response)?;
    }
    output.flush()?;
    Ok(())
}

pub(super) fn ask_options(mode: AskMode) -> RunOptions {
    let mut opts = RunOptions::new();
    if mode != AskMode::Default {
        opts.insert("mode".to_string(), Value::from(mode.as_str()));
    }
    opts
}

pub(super) fn write_answer<W: Write>(output: &mut W, response: &AnswerResponse) -> Result<()> {
    writeln!(output, "{}", response.final_answer.trim_end())?;
    writeln!(output)?;
    writeln!(output, "Citations: {}", response.citations.len())?;
    for (rank, citation) in response.citations.iter().enumerate() {
        writeln!(output, "{}.\t{}", rank + 1, render_citation(citation))?;
    }
    Ok(())
}

pub(super) fn render_citation(citation: &Citation) -> String {
    let mut rendered = format!("[{}] {}", citation.kind.as_str(), citation.path);
    if let Some((start, end)) = citation.lines {
        if start == end {
            rendered.push_str(&format!(":{start}"));
        } else {
            rendered.push_str(&format!(":{start}-{end}"));
        }
    }
    match (&citation.repo, &citation.sha) {
        (Some(repo), Some(sha)) => rendered.push_str(&format!(" ({repo}@{sha})")),
        (Some(repo), None) => rendered.push_str(&format!(" ({repo})")),
        (None, Some(sha)) => rendered.push_str(&format!(" (@{sha})")),
        (None, None) => {}
    }
    if let Some(env) = &citation.source_env {
        rendered.push_str(&format!(" env={env}"));
    }
    rendered
}
