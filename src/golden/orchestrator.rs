use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Instant;

use tracing::{info, warn};

use crate::model::{GoldenItem, RunResult};
use crate::service::{AnswerService, RunOptions};

use super::scoring::score;
use super::store::GoldenStore;

pub const REQUEST_FAILED_MESSAGE: &str = "Request failed";
pub const WORKER_PANICKED_MESSAGE: &str = "run worker panicked";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RunPhase {
    Idle,
    Running,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Started {
        index: usize,
        id: String,
    },
    Finished {
        index: usize,
        id: String,
        result: RunResult,
    },
    Done {
        cancelled: bool,
    },
}

#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub completed: usize,
    pub cancelled: bool,
}

pub struct Orchestrator {
    service: Arc<dyn AnswerService>,
    phase: RunPhase,
    results_ready: bool,
    cancel: CancelToken,
}

impl Orchestrator {
    pub fn new(service: Arc<dyn AnswerService>) -> Self {
        Self {
            service,
            phase: RunPhase::Idle,
            results_ready: false,
            cancel: CancelToken::new(),
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn results_ready(&self) -> bool {
        self.results_ready
    }

    /// Token for the current or next `run_all`; a finished run gets a fresh one.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn run_one(&self, store: &mut GoldenStore, index: usize) -> bool {
        let Some(entry) = store.get(index) else {
            return false;
        };
        let item = entry.item.clone();
        let previous = entry.result.clone();

        store.set_result(index, begin_run(&previous));
        let result = execute_item(self.service.as_ref(), &item, &previous);
        store.set_result(index, result)
    }

    /// Runs every item in list order on a single worker thread. Results are applied
    /// to `store` on the calling thread as each item finishes. The worker waits for
    /// `on_event` to return on every `Finished` before deciding whether to continue,
    /// so a cancel issued from the handler stops the very next item.
    pub fn run_all<F>(&mut self, store: &mut GoldenStore, mut on_event: F) -> RunOutcome
    where
        F: FnMut(&RunEvent, &GoldenStore),
    {
        self.phase = RunPhase::Running;
        self.results_ready = false;
        info!(items = store.len(), "golden run started");

        let jobs = store
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| (index, entry.item.clone(), entry.result.clone()))
            .collect::<Vec<_>>();

        let (tx, rx) = mpsc::channel::<RunEvent>();
        let (ack_tx, ack_rx) = mpsc::channel::<()>();
        let service = Arc::clone(&self.service);
        let cancel = self.cancel.clone();
        let worker =
            thread::spawn(move || run_queue(service.as_ref(), jobs, &cancel, &tx, &ack_rx));

        let mut outcome = RunOutcome::default();
        let mut saw_done = false;
        for event in rx {
            match &event {
                RunEvent::Started { index, .. } => {
                    if let Some(begun) = store.get(*index).map(|entry| begin_run(&entry.result)) {
                        store.set_result(*index, begun);
                    }
                }
                RunEvent::Finished { index, result, .. } => {
                    store.set_result(*index, result.clone());
                    outcome.completed += 1;
                }
                RunEvent::Done { cancelled } => {
                    outcome.cancelled = *cancelled;
                    saw_done = true;
                }
            }
            on_event(&event, &*store);
            if matches!(event, RunEvent::Finished { .. }) {
                let _ = ack_tx.send(());
            }
        }

        if worker.join().is_err() || !saw_done {
            warn!("golden run worker panicked");
            abandon_running(store);
            outcome.cancelled = true;
            on_event(&RunEvent::Done { cancelled: true }, &*store);
        }

        self.phase = RunPhase::Done;
        self.results_ready = true;
        self.cancel = CancelToken::new();
        info!(
            completed = outcome.completed,
            cancelled = outcome.cancelled,
            "golden run finished"
        );

        outcome
    }
}

fn run_queue(
    service: &dyn AnswerService,
    jobs: Vec<(usize, GoldenItem, RunResult)>,
    cancel: &CancelToken,
    tx: &Sender<RunEvent>,
    ack: &Receiver<()>,
) {
    let mut cancelled = false;
    for (index, item, previous) in jobs {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        let started = RunEvent::Started {
            index,
            id: item.id.clone(),
        };
        if tx.send(started).is_err() {
            return;
        }

        let result = execute_item(service, &item, &previous);
        let finished = RunEvent::Finished {
            index,
            id: item.id,
            result,
        };
        if tx.send(finished).is_err() || ack.recv().is_err() {
            return;
        }
    }

    let _ = tx.send(RunEvent::Done { cancelled });
}

/// Settles entries left mid-run by a dead worker, keeping their previous scores.
fn abandon_running(store: &mut GoldenStore) {
    let stuck = store
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.result.running)
        .map(|(index, entry)| {
            let result = RunResult {
                running: false,
                error: WORKER_PANICKED_MESSAGE.to_string(),
                ..entry.result.clone()
            };
            (index, result)
        })
        .collect::<Vec<_>>();
    for (index, result) in stuck {
        store.set_result(index, result);
    }
}

fn begin_run(previous: &RunResult) -> RunResult {
    RunResult {
        running: true,
        resp: None,
        error: String::new(),
        ..previous.clone()
    }
}

/// A failed request keeps the previous scores and timing and only records the error.
fn execute_item(
    service: &dyn AnswerService,
    item: &GoldenItem,
    previous: &RunResult,
) -> RunResult {
    let started = Instant::now();
    match service.run(&item.query, &RunOptions::new()) {
        Ok(resp) => {
            let ms = (started.elapsed().as_secs_f64() * 1000.0).round() as u64;
            let score = score(&resp, item.expects.as_ref());
            info!(
                id = %item.id,
                ms,
                exact = score.exact,
                cits_ok = score.cits_ok,
                grounded = score.grounded,
                pass = score.passes(),
                "golden query scored"
            );
            RunResult {
                running: false,
                ms: Some(ms),
                resp: Some(resp),
                score: Some(score),
                pass: Some(score.passes()),
                error: String::new(),
            }
        }
        Err(err) => {
            let message = format!("{err:#}");
            let message = if message.trim().is_empty() {
                REQUEST_FAILED_MESSAGE.to_string()
            } else {
                message
            };
            warn!(id = %item.id, error = %message, "golden query failed");
            RunResult {
                running: false,
                resp: None,
                error: message,
                ..previous.clone()
            }
        }
    }
}
