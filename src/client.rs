use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::grid::{ColorIndex, Grid, VOID};
use crate::solver::{MultiIslandSolver, SolveOutcome};

/// Ways a background solve can fail to complete.
///
/// Distinct from "no solution found", which completes normally with an
/// absent solution in the [`SolveOutcome`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The worker thread panicked before producing an outcome.
    #[error("solver worker panicked: {0}")]
    WorkerPanicked(String),
}

/// Everything a solve needs, in the shape hosts post to the worker.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    /// The board to solve, read-only to the solver.
    pub grid: Grid,
    /// Which color index marks cells outside the puzzle.
    #[serde(default = "default_void_color")]
    pub void_color_index: ColorIndex,
    /// Palette strings, indexed by color. Short palettes fall back to a
    /// placeholder name per color.
    #[serde(default)]
    pub palette: Vec<String>,
}

fn default_void_color() -> ColorIndex {
    VOID
}

struct Worker {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Runs solves off the caller's thread, at most one in flight at a time.
///
/// [`solve`](Self::solve) hands back a channel carrying exactly one message,
/// unless the run is [`terminate`](Self::terminate)d first, in which case
/// the channel disconnects without ever delivering anything. Starting a new
/// solve terminates the outstanding one.
#[derive(Default)]
pub struct SolverClient {
    worker: Option<Worker>,
}

impl SolverClient {
    /// A client with no solve in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a solve on a background thread.
    pub fn solve(&mut self, request: SolveRequest) -> Receiver<Result<SolveOutcome, ClientError>> {
        self.terminate();

        let cancel = Arc::new(AtomicBool::new(false));
        let token = Arc::clone(&cancel);
        let (tx, rx) = mpsc::sync_channel(1);

        let handle = thread::spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                MultiIslandSolver::new(&request.grid, request.void_color_index, request.palette.clone())
                    .with_cancel_token(Arc::clone(&token))
                    .solve()
            }));

            // a terminated run stays silent; the receiver observes the
            // disconnect instead of a degraded result
            if token.load(Ordering::Relaxed) {
                debug!("solve terminated, discarding outcome");
                return;
            }

            let message = match result {
                Ok(outcome) => Ok(outcome),
                Err(payload) => Err(ClientError::WorkerPanicked(panic_message(payload.as_ref()))),
            };
            let _ = tx.send(message);
        });

        self.worker = Some(Worker { cancel, handle });
        rx
    }

    /// Run a solve synchronously on the calling thread.
    pub fn solve_blocking(request: &SolveRequest) -> SolveOutcome {
        MultiIslandSolver::new(&request.grid, request.void_color_index, request.palette.clone())
            .solve()
    }

    /// Best-effort cancellation of the in-flight solve, if any.
    ///
    /// The worker notices at its next depth-limit or candidate-color
    /// boundary and exits without responding.
    pub fn terminate(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.cancel.store(true, Ordering::Relaxed);
            // detached; the thread winds down on its own
            drop(worker.handle);
        }
    }
}

impl Drop for SolverClient {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}
