use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::{ExportArgs, ExportFormat};
use crate::golden::{GoldenStore, export_file_name, export_golden_lines, export_golden_set};
use crate::util::write_text_file;

pub fn run(args: ExportArgs) -> Result<()> {
    let mut store = GoldenStore::new();
    store.import_file(&args.golden)?;

    for addition in &args.additions {
        let added = parse_addition(addition).is_some_and(|(id, query)| store.add(id, query));
        if added {
            info!(value = %addition, "added golden item");
        } else {
            warn!(value = %addition, "ignored golden item addition; expected non-empty ID=QUERY");
        }
    }

    for id in &args.removals {
        let removed = store.remove(id);
        if removed == 0 {
            warn!(id = %id, "no golden item to remove");
        } else {
            info!(id = %id, removed, "removed golden item");
        }
    }

    let (text, file_name) = match args.format {
        ExportFormat::Json => (
            export_golden_set(store.items())?,
            export_file_name(Utc::now(), "json"),
        ),
        ExportFormat::Jsonl => (
            export_golden_lines(store.items())?,
            export_file_name(Utc::now(), "jsonl"),
        ),
    };

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| args.output_dir.join(file_name));
    write_text_file(&path, &text)?;
    info!(path = %path.display(), items = store.len(), "exported golden set");

    Ok(())
}

pub(super) fn parse_addition(value: &str) -> Option<(&str, &str)> {
    value.split_once('=')
}
