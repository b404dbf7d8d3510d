use crate::base::{ConvergenceEntry, Problem, RunFailure, RunOutcome, SolverError};
use crate::fem::run;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Runs a problem on its own worker thread
///
/// The convergence entries are forwarded over a channel as soon as they are produced.
/// The worker owns its problem; nothing is shared except the cancellation flag.
pub struct NativeJob {
    handle: JoinHandle<Result<RunOutcome, RunFailure>>,
    receiver: Receiver<ConvergenceEntry>,
    cancel: Arc<AtomicBool>,
}

impl NativeJob {
    /// Starts the worker thread
    pub fn spawn(problem: Problem) -> Self {
        let (sender, receiver) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let handle = thread::spawn(move || {
            let mut sink = |entry: &ConvergenceEntry| {
                // the receiver may have been dropped; the run carries on
                let _ = sender.send(*entry);
            };
            run(&problem, &mut sink, &flag)
        });
        NativeJob {
            handle,
            receiver,
            cancel,
        }
    }

    /// Raises the cancellation flag (the worker stops at the next outer iteration)
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Returns the entries received so far without blocking
    pub fn try_progress(&self) -> Vec<ConvergenceEntry> {
        self.receiver.try_iter().collect()
    }

    /// Blocks until the next entry arrives; returns None when the worker has finished
    pub fn progress(&self) -> Option<ConvergenceEntry> {
        self.receiver.recv().ok()
    }

    /// Waits for the worker and returns its outcome
    pub fn join(self) -> Result<RunOutcome, RunFailure> {
        match self.handle.join() {
            Ok(outcome) => outcome,
            Err(_) => Err(SolverError::InvalidInput("the native worker panicked".to_string()).into()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
