use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub const DEFAULT_GOLDEN_PATH: &str = "assets/golden.json";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Parser, Debug)]
#[command(
    name = "goldeneval",
    version,
    about = "Golden-set evaluation for a question-answering service"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Run(RunArgs),
    Ask(AskArgs),
    Export(ExportArgs),
    Score(ScoreArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    #[arg(long, env = "EVAL_API_URL", default_value = DEFAULT_API_URL)]
    pub api: String,

    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub service: ServiceArgs,

    /// Golden set (.json array or .jsonl); defaults to the bundled asset.
    #[arg(long)]
    pub golden: Option<PathBuf>,

    /// Run only the item with this id.
    #[arg(long)]
    pub id: Option<String>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AskArgs {
    #[command(flatten)]
    pub service: ServiceArgs,

    #[arg(long)]
    pub query: String,

    #[arg(long, value_enum, default_value_t = AskMode::Default)]
    pub mode: AskMode,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Retrieval mode forwarded to the answering service as `opts.mode`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum AskMode {
    Default,
    HighPrecision,
    DeepSearch,
}

impl AskMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::HighPrecision => "high_precision",
            Self::DeepSearch => "deep_search",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Jsonl,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(long)]
    pub golden: PathBuf,

    /// Extra item as ID=QUERY; blank ids or queries are skipped.
    #[arg(long = "add")]
    pub additions: Vec<String>,

    #[arg(long = "remove")]
    pub removals: Vec<String>,

    #[arg(long, conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
    pub format: ExportFormat,
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[arg(long)]
    pub golden: PathBuf,

    #[arg(long)]
    pub id: String,

    /// Recorded answering-service response (JSON object).
    #[arg(long)]
    pub response: PathBuf,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
