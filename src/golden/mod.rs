mod codec;
mod orchestrator;
mod scoring;
mod store;

pub use self::codec::{export_file_name, export_golden_lines, export_golden_set};
pub use self::orchestrator::{Orchestrator, RunEvent};
pub use self::scoring::score;
pub use self::store::{GoldenEntry, GoldenStore, RunSummary};
